/**
 * Order Queries
 *
 * Listing, lookup, status updates and deletion. Placement and buyer
 * cancellation live in `placement`; status updates and deletion reuse its
 * row lock and stock restore so every path into `cancelled` (or out of the
 * table) gives the stock back exactly once.
 *
 * # Status Transitions
 *
 * `cancelled` is final and `delivered` cannot be cancelled. Every other
 * move is allowed, including backwards ones such as `shipped -> processing`.
 */

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::backend::notifications::create_notification;
use crate::backend::orders::error::OrderError;
use crate::backend::orders::placement::{
    finish, line_item_ref, lock_order, restore_stock, set_status, PgTransaction,
};
use crate::shared::{
    CatalogKind, OrderDetail, OrderFilters, OrderLine, OrderStatus, OrderStatusUpdate,
    OrderSummary, ShippingAddress,
};

/// Whose orders a listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Orders placed by this user
    Owner(Uuid),
    /// Orders containing at least one item of this supplier
    Supplier(Uuid),
    /// Every order (admin)
    All,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Uuid,
    total_cents: i64,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    status: String,
    shipping_company: Option<String>,
    tracking_number: Option<String>,
    customer_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: i64,
    order_id: i64,
    item_kind: String,
    product_id: Option<Uuid>,
    supply_id: Option<Uuid>,
    quantity: i32,
    price_at_purchase_cents: i64,
    name: Option<String>,
    brand: Option<String>,
    supplier_id: Option<Uuid>,
    is_reviewed: bool,
}

/// A committed status change, for audit logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: i64,
    pub owner: Uuid,
    pub customer_name: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// An order removed by `delete_order`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedOrder {
    pub order_id: i64,
    pub customer_name: String,
    pub status: OrderStatus,
    pub stock_restored: bool,
}

const ORDER_COLUMNS: &str = r#"
    SELECT o.id, o.user_id, o.total_cents, o.shipping_address, o.payment_method, o.status,
           o.shipping_company, o.tracking_number,
           u.first_name || ' ' || u.last_name AS customer_name,
           o.created_at, o.updated_at
    FROM orders o
    JOIN users u ON u.id = o.user_id
"#;

const SUPPLIER_OWNS_LINE: &str = r#"
    SELECT 1 FROM order_items oi
    LEFT JOIN products p ON p.id = oi.product_id
    LEFT JOIN supplies s ON s.id = oi.supply_id
    WHERE oi.order_id = o.id AND (p.supplier_id = "#;

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(message.into())
}

fn parse_status(raw: &str) -> Result<OrderStatus, sqlx::Error> {
    OrderStatus::from_str(raw).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

impl LineRow {
    fn into_line(self) -> Result<OrderLine, sqlx::Error> {
        let kind = CatalogKind::from_str(&self.item_kind)
            .ok_or_else(|| decode_error(format!("unknown item kind '{}'", self.item_kind)))?;

        Ok(OrderLine {
            id: self.id,
            order_id: self.order_id,
            kind,
            item_id: line_item_ref(&self.item_kind, self.product_id, self.supply_id).map(|(_, id)| id),
            name: self.name,
            brand: self.brand,
            quantity: self.quantity,
            price_at_purchase_cents: self.price_at_purchase_cents,
            is_reviewed: self.is_reviewed,
        })
    }
}

impl OrderRow {
    fn into_summary(self, items: Vec<OrderLine>, with_customer: bool) -> Result<OrderSummary, sqlx::Error> {
        Ok(OrderSummary {
            id: self.id,
            user_id: self.user_id,
            total_cents: self.total_cents,
            status: parse_status(&self.status)?,
            shipping_company: self.shipping_company,
            tracking_number: self.tracking_number,
            customer_name: if with_customer { self.customer_name } else { None },
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }

    fn into_detail(self, items: Vec<OrderLine>) -> Result<OrderDetail, sqlx::Error> {
        Ok(OrderDetail {
            id: self.id,
            user_id: self.user_id,
            total_cents: self.total_cents,
            status: parse_status(&self.status)?,
            shipping_address: self.shipping_address.0,
            payment_method: self.payment_method,
            shipping_company: self.shipping_company,
            tracking_number: self.tracking_number,
            customer_name: self.customer_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

/// List orders in `scope`, newest first, each with its lines
///
/// Supplier listings only carry the supplier's own lines.
pub async fn list_orders(
    pool: &PgPool,
    scope: OrderScope,
    filters: &OrderFilters,
) -> Result<Vec<OrderSummary>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(ORDER_COLUMNS);
    query.push(" WHERE TRUE");

    match scope {
        OrderScope::Owner(user_id) => {
            query.push(" AND o.user_id = ").push_bind(user_id);
        }
        OrderScope::Supplier(supplier_id) => {
            query
                .push(" AND EXISTS (")
                .push(SUPPLIER_OWNS_LINE)
                .push_bind(supplier_id)
                .push(" OR s.supplier_id = ")
                .push_bind(supplier_id)
                .push("))");
        }
        OrderScope::All => {}
    }

    if let Some(status) = filters.status {
        query.push(" AND o.status = ").push_bind(status.as_str());
    }
    let (from, until) = filters.window();
    if let Some(from) = from {
        query.push(" AND o.created_at >= ").push_bind(from);
    }
    if let Some(until) = until {
        query.push(" AND o.created_at < ").push_bind(until);
    }
    query.push(" ORDER BY o.created_at DESC, o.id DESC");

    let rows: Vec<OrderRow> = query.build_query_as().fetch_all(pool).await?;

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let supplier = match scope {
        OrderScope::Supplier(id) => Some(id),
        _ => None,
    };
    let mut lines = fetch_lines(pool, &ids, supplier).await?;

    let with_customer = !matches!(scope, OrderScope::Owner(_));
    rows.into_iter()
        .map(|row| {
            let items = lines.remove(&row.id).unwrap_or_default();
            row.into_summary(items, with_customer)
        })
        .collect()
}

/// Lines of the given orders grouped by order id
async fn fetch_lines(
    pool: &PgPool,
    order_ids: &[i64],
    supplier: Option<Uuid>,
) -> Result<HashMap<i64, Vec<OrderLine>>, sqlx::Error> {
    let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows: Vec<LineRow> = sqlx::query_as(
        r#"
        SELECT oi.id, oi.order_id, oi.item_kind, oi.product_id, oi.supply_id,
               oi.quantity, oi.price_at_purchase_cents,
               COALESCE(p.name, s.name) AS name,
               COALESCE(p.brand, s.brand) AS brand,
               COALESCE(p.supplier_id, s.supplier_id) AS supplier_id,
               EXISTS (SELECT 1 FROM reviews r WHERE r.order_item_id = oi.id) AS is_reviewed
        FROM order_items oi
        LEFT JOIN products p ON p.id = oi.product_id
        LEFT JOIN supplies s ON s.id = oi.supply_id
        WHERE oi.order_id = ANY($1)
        ORDER BY oi.id
        "#,
    )
    .bind(order_ids)
    .fetch_all(pool)
    .await?;

    for row in rows {
        if supplier.is_some() && row.supplier_id != supplier {
            continue;
        }
        let order_id = row.order_id;
        grouped.entry(order_id).or_default().push(row.into_line()?);
    }

    Ok(grouped)
}

/// Load one order in `scope`
///
/// Owners see only their own orders. Suppliers see only orders containing
/// their items, and only those lines; anything else is reported as missing.
pub async fn find_order(
    pool: &PgPool,
    order_id: i64,
    scope: OrderScope,
) -> Result<Option<OrderDetail>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(ORDER_COLUMNS);
    query.push(" WHERE o.id = ").push_bind(order_id);
    if let OrderScope::Owner(user_id) = scope {
        query.push(" AND o.user_id = ").push_bind(user_id);
    }

    let row: Option<OrderRow> = query.build_query_as().fetch_optional(pool).await?;
    let Some(row) = row else {
        return Ok(None);
    };

    let supplier = match scope {
        OrderScope::Supplier(id) => Some(id),
        _ => None,
    };
    let items = fetch_lines(pool, &[order_id], supplier)
        .await?
        .remove(&order_id)
        .unwrap_or_default();

    if supplier.is_some() && items.is_empty() {
        return Ok(None);
    }

    row.into_detail(items).map(Some)
}

/// Whether the order contains at least one item of the supplier
pub async fn supplier_has_items(
    pool: &PgPool,
    order_id: i64,
    supplier_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "SELECT EXISTS ({} $2 OR s.supplier_id = $2)) FROM orders o WHERE o.id = $1",
        SUPPLIER_OWNS_LINE
    );

    let found: Option<bool> = sqlx::query_scalar(&sql)
        .bind(order_id)
        .bind(supplier_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.unwrap_or(false))
}

/// Set status and shipping details
///
/// Absent shipping fields keep their stored value. Moving an open order to
/// `cancelled` gives its stock back; moving out of `cancelled` is rejected.
/// Moving an order to `delivered` notifies its buyer after the commit.
pub async fn update_order_status(
    pool: &PgPool,
    order_id: i64,
    update: &OrderStatusUpdate,
) -> Result<StatusChange, OrderError> {
    let mut tx = pool.begin().await?;
    let result = update_status_in_tx(&mut tx, order_id, update).await;
    let change = finish(tx, result, "status update").await?;

    tracing::info!("Order {} moved from {} to {}", order_id, change.from, change.to);

    if change.to == OrderStatus::Delivered && change.from != OrderStatus::Delivered {
        let message = format!("Your order #{} has been delivered.", order_id);
        let link = format!("/orders/{}", order_id);
        if let Err(e) = create_notification(pool, change.owner, &message, Some(&link)).await {
            tracing::warn!("Failed to notify {} about delivery of {}: {:?}", change.owner, order_id, e);
        }
    }

    Ok(change)
}

async fn update_status_in_tx(
    tx: &mut PgTransaction<'_>,
    order_id: i64,
    update: &OrderStatusUpdate,
) -> Result<StatusChange, OrderError> {
    let order = lock_order(tx, order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

    if !order.status.allows_transition_to(update.status) {
        return Err(OrderError::InvalidTransition {
            order_id,
            from: order.status,
            to: update.status,
        });
    }

    if update.status == OrderStatus::Cancelled && order.status.holds_stock() {
        restore_stock(tx, &[order_id]).await?;
    }

    sqlx::query(
        r#"
        UPDATE orders
        SET status = $1,
            shipping_company = COALESCE($2, shipping_company),
            tracking_number = COALESCE($3, tracking_number),
            updated_at = NOW()
        WHERE id = $4
        "#,
    )
    .bind(update.status.as_str())
    .bind(update.shipping_company.as_deref())
    .bind(update.tracking_number.as_deref())
    .bind(order_id)
    .execute(&mut **tx)
    .await?;

    Ok(StatusChange {
        order_id,
        owner: order.owner,
        customer_name: order.customer_name,
        from: order.status,
        to: update.status,
    })
}

/// Supplier-side status update, allowed only on orders with the supplier's items
pub async fn update_supplier_order(
    pool: &PgPool,
    order_id: i64,
    supplier_id: Uuid,
    update: &OrderStatusUpdate,
) -> Result<StatusChange, OrderError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
        .bind(order_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Err(OrderError::NotFound(order_id));
    }

    if !supplier_has_items(pool, order_id, supplier_id).await? {
        tracing::warn!("Supplier {} tried to update order {}", supplier_id, order_id);
        return Err(OrderError::NotSupplierOrder(order_id));
    }

    update_order_status(pool, order_id, update).await
}

/// Delete an order and its lines; `None` when it did not exist
///
/// An order that still holds stock gives it back first.
pub async fn delete_order(pool: &PgPool, order_id: i64) -> Result<Option<DeletedOrder>, OrderError> {
    let mut tx = pool.begin().await?;
    let result = delete_order_in_tx(&mut tx, order_id).await;
    let deleted = finish(tx, result, "order deletion").await?;

    if let Some(deleted) = &deleted {
        tracing::info!(
            "Order {} deleted (was {}, stock restored: {})",
            order_id,
            deleted.status,
            deleted.stock_restored
        );
    }

    Ok(deleted)
}

async fn delete_order_in_tx(
    tx: &mut PgTransaction<'_>,
    order_id: i64,
) -> Result<Option<DeletedOrder>, OrderError> {
    let Some(order) = lock_order(tx, order_id).await? else {
        return Ok(None);
    };

    let stock_restored = order.status.holds_stock();
    if stock_restored {
        restore_stock(tx, &[order_id]).await?;
    }

    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(&mut **tx)
        .await?;

    Ok(Some(DeletedOrder {
        order_id,
        customer_name: order.customer_name,
        status: order.status,
        stock_restored,
    }))
}

/// Cancel every open order of `user_id`, returning their ids
///
/// Used before an account is removed so the stock it holds is released.
pub(crate) async fn cancel_open_orders(
    tx: &mut PgTransaction<'_>,
    user_id: Uuid,
) -> Result<Vec<i64>, sqlx::Error> {
    let open: Vec<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM orders
        WHERE user_id = $1 AND status NOT IN ('delivered', 'cancelled')
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut **tx)
    .await?;

    restore_stock(tx, &open).await?;
    for order_id in &open {
        set_status(tx, *order_id, OrderStatus::Cancelled).await?;
    }

    Ok(open)
}
