/**
 * Order Placement and Cancellation
 *
 * Both operations run in a single database transaction. Stock is re-read
 * under `SELECT ... FOR UPDATE` so concurrent purchases of the same item are
 * serialized by the database: the second buyer waits for the first commit
 * and then sees the reduced stock.
 *
 * # Placement
 *
 * 1. Lock every referenced item (in `(kind, id)` order) and check its stock
 *    against the summed quantity of all lines that reference it
 * 2. Insert the order header with status `pending`
 * 3. Insert one line per cart line at the buyer's snapshot price
 * 4. Decrement stock
 * 5. Commit, then notify suppliers
 *
 * Any failure before the commit rolls everything back.
 *
 * # Cancellation
 *
 * Whoever cancels (the buyer here, an admin or supplier through a status
 * change, or an admin deleting an open order) goes through
 * `restore_stock`, under the order's row lock, so stock comes back exactly
 * once.
 *
 * # Lock Ordering
 *
 * Items are locked in a fixed global order so two orders touching the same
 * items in different cart order cannot deadlock.
 */

use std::collections::{BTreeMap, BTreeSet};

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::backend::notifications::create_notification;
use crate::backend::orders::error::OrderError;
use crate::shared::{CatalogKind, OrderStatus, PlaceOrderRequest};

pub(crate) type PgTransaction<'c> = Transaction<'c, Postgres>;

/// Stock of one item after an order was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockChange {
    pub kind: CatalogKind,
    pub item_id: Uuid,
    pub name: String,
    pub supplier_id: Uuid,
    pub remaining: i32,
}

/// Result of a committed placement
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order_id: i64,
    pub stock_changes: Vec<StockChange>,
}

/// A notification to send once the order is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNotification {
    pub user_id: Uuid,
    pub message: String,
    pub link_url: String,
}

struct LockedItem {
    name: String,
    stock: i32,
    supplier_id: Uuid,
}

/// Place an order for `user_id`
///
/// The request is validated again here, before any row is touched. On
/// success the order is committed and supplier notifications have been
/// attempted; notification failures are logged and never turn a placed
/// order into an error.
pub async fn place_order(
    pool: &PgPool,
    user_id: Uuid,
    request: &PlaceOrderRequest,
    low_stock_threshold: i32,
) -> Result<PlacedOrder, OrderError> {
    request.validate()?;

    let mut tx = pool.begin().await?;
    let result = place_order_in_tx(&mut tx, user_id, request).await;
    let placed = finish(tx, result, "order placement").await?;

    tracing::info!(
        "Order {} placed by {} ({} lines, {} items)",
        placed.order_id,
        user_id,
        request.lines.len(),
        placed.stock_changes.len()
    );

    let planned = plan_notifications(placed.order_id, &placed.stock_changes, low_stock_threshold);
    dispatch_notifications(pool, &planned).await;

    Ok(placed)
}

/// Commit on success, roll back on failure
pub(crate) async fn finish<T>(
    tx: PgTransaction<'_>,
    result: Result<T, OrderError>,
    operation: &str,
) -> Result<T, OrderError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Failed to roll back {}: {:?}", operation, rollback_err);
            }
            Err(e)
        }
    }
}

async fn place_order_in_tx(
    tx: &mut PgTransaction<'_>,
    user_id: Uuid,
    request: &PlaceOrderRequest,
) -> Result<PlacedOrder, OrderError> {
    let demand = request.demand();

    let mut locked: BTreeMap<(CatalogKind, Uuid), LockedItem> = BTreeMap::new();
    for (&(kind, item_id), &requested) in &demand {
        let item = lock_item(tx, kind, item_id)
            .await?
            .ok_or(OrderError::ItemUnavailable { kind, item_id })?;

        if item.stock < requested {
            tracing::warn!(
                "Insufficient stock for {} {}: {} available, {} requested",
                kind,
                item_id,
                item.stock,
                requested
            );
            return Err(OrderError::InsufficientStock {
                item_id,
                name: item.name,
                available: item.stock,
                requested,
            });
        }

        locked.insert((kind, item_id), item);
    }

    let order_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (user_id, total_cents, shipping_address, payment_method, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(request.total_cents)
    .bind(Json(&request.shipping_address))
    .bind(&request.payment_method)
    .bind(OrderStatus::Pending.as_str())
    .fetch_one(&mut **tx)
    .await?;

    for line in &request.lines {
        let (product_id, supply_id) = match line.kind {
            CatalogKind::Product => (Some(line.item_id), None),
            CatalogKind::Supply => (None, Some(line.item_id)),
        };

        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, item_kind, product_id, supply_id, quantity, price_at_purchase_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(order_id)
        .bind(line.kind.as_str())
        .bind(product_id)
        .bind(supply_id)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .execute(&mut **tx)
        .await?;
    }

    let mut stock_changes = Vec::with_capacity(locked.len());
    for ((kind, item_id), item) in locked {
        let requested = demand.get(&(kind, item_id)).copied().unwrap_or(0);
        let remaining = adjust_stock(tx, kind, item_id, -requested).await?;

        stock_changes.push(StockChange {
            kind,
            item_id,
            name: item.name,
            supplier_id: item.supplier_id,
            remaining,
        });
    }

    Ok(PlacedOrder {
        order_id,
        stock_changes,
    })
}

async fn lock_item(
    tx: &mut PgTransaction<'_>,
    kind: CatalogKind,
    item_id: Uuid,
) -> Result<Option<LockedItem>, sqlx::Error> {
    let sql = format!(
        "SELECT name, stock, supplier_id FROM {} WHERE id = $1 FOR UPDATE",
        kind.table()
    );

    let row: Option<(String, i32, Uuid)> = sqlx::query_as(&sql)
        .bind(item_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(row.map(|(name, stock, supplier_id)| LockedItem {
        name,
        stock,
        supplier_id,
    }))
}

/// Add `delta` to an item's stock and return the new stock
async fn adjust_stock(
    tx: &mut PgTransaction<'_>,
    kind: CatalogKind,
    item_id: Uuid,
    delta: i32,
) -> Result<i32, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET stock = stock + $1, updated_at = NOW() WHERE id = $2 RETURNING stock",
        kind.table()
    );

    sqlx::query_scalar(&sql)
        .bind(delta)
        .bind(item_id)
        .fetch_one(&mut **tx)
        .await
}

/// Decide which notifications a committed order triggers
///
/// Every item left at or below `low_stock_threshold` produces a low-stock
/// notice for its supplier. Every distinct supplier gets exactly one
/// new-order notice.
pub fn plan_notifications(
    order_id: i64,
    stock_changes: &[StockChange],
    low_stock_threshold: i32,
) -> Vec<PlannedNotification> {
    let mut planned = Vec::new();

    for change in stock_changes {
        if change.remaining <= low_stock_threshold {
            planned.push(PlannedNotification {
                user_id: change.supplier_id,
                message: format!(
                    "Low stock: your {} \"{}\" now has {} units.",
                    change.kind, change.name, change.remaining
                ),
                link_url: "/supplier/stats/low-stock".to_string(),
            });
        }
    }

    let suppliers: BTreeSet<Uuid> = stock_changes.iter().map(|c| c.supplier_id).collect();
    for supplier_id in suppliers {
        planned.push(PlannedNotification {
            user_id: supplier_id,
            message: format!(
                "New order received! Order #{} has items for you to prepare.",
                order_id
            ),
            link_url: "/supplier/orders".to_string(),
        });
    }

    planned
}

async fn dispatch_notifications(pool: &PgPool, planned: &[PlannedNotification]) {
    for notification in planned {
        if let Err(e) = create_notification(
            pool,
            notification.user_id,
            &notification.message,
            Some(&notification.link_url),
        )
        .await
        {
            tracing::warn!(
                "Failed to notify {} ({}): {:?}",
                notification.user_id,
                notification.message,
                e
            );
        }
    }
}

/// Cancel a pending order owned by `user_id` and put its stock back
///
/// Orders that do not exist or belong to someone else are reported as not
/// found; orders past `pending` are not cancellable. Either way nothing
/// changes.
pub async fn cancel_order(pool: &PgPool, order_id: i64, user_id: Uuid) -> Result<(), OrderError> {
    let mut tx = pool.begin().await?;
    let result = cancel_order_in_tx(&mut tx, order_id, user_id).await;
    finish(tx, result, "cancellation").await?;

    tracing::info!("Order {} cancelled by {}", order_id, user_id);
    Ok(())
}

async fn cancel_order_in_tx(
    tx: &mut PgTransaction<'_>,
    order_id: i64,
    user_id: Uuid,
) -> Result<(), OrderError> {
    let order = lock_order(tx, order_id)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

    if order.owner != user_id {
        tracing::warn!("User {} tried to cancel order {} of {}", user_id, order_id, order.owner);
        return Err(OrderError::NotFound(order_id));
    }
    if order.status != OrderStatus::Pending {
        return Err(OrderError::NotCancellable { order_id });
    }

    restore_stock(tx, &[order_id]).await?;
    set_status(tx, order_id, OrderStatus::Cancelled).await?;

    Ok(())
}

/// An order row held under `FOR UPDATE`
#[derive(Debug, Clone)]
pub(crate) struct LockedOrder {
    pub owner: Uuid,
    pub status: OrderStatus,
    pub customer_name: String,
}

/// Lock an order row for the rest of the transaction
pub(crate) async fn lock_order(
    tx: &mut PgTransaction<'_>,
    order_id: i64,
) -> Result<Option<LockedOrder>, sqlx::Error> {
    let row: Option<(Uuid, String, String)> = sqlx::query_as(
        r#"
        SELECT o.user_id, o.status, u.first_name || ' ' || u.last_name
        FROM orders o
        JOIN users u ON u.id = o.user_id
        WHERE o.id = $1
        FOR UPDATE OF o
        "#,
    )
    .bind(order_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.map(|(owner, status, customer_name)| {
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(LockedOrder {
            owner,
            status,
            customer_name,
        })
    })
    .transpose()
}

pub(crate) async fn set_status(
    tx: &mut PgTransaction<'_>,
    order_id: i64,
    status: OrderStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Give the stock held by `order_ids` back to the catalog
///
/// Callers hold the row locks of these orders and have checked that they
/// still hold stock. Quantities are summed per item and applied in
/// `(kind, id)` order, the same order placement locks items in.
pub(crate) async fn restore_stock(
    tx: &mut PgTransaction<'_>,
    order_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if order_ids.is_empty() {
        return Ok(());
    }

    let lines: Vec<(i64, String, Option<Uuid>, Option<Uuid>, i32)> = sqlx::query_as(
        "SELECT order_id, item_kind, product_id, supply_id, quantity FROM order_items WHERE order_id = ANY($1)",
    )
    .bind(order_ids)
    .fetch_all(&mut **tx)
    .await?;

    let mut restore: BTreeMap<(CatalogKind, Uuid), i32> = BTreeMap::new();
    for (order_id, item_kind, product_id, supply_id, quantity) in lines {
        match line_item_ref(&item_kind, product_id, supply_id) {
            Some(key) => {
                let total = restore.entry(key).or_insert(0);
                *total = total.saturating_add(quantity);
            }
            None => tracing::warn!(
                "Order {} references a removed {} item; its stock is not restored",
                order_id,
                item_kind
            ),
        }
    }

    for ((kind, item_id), quantity) in restore {
        adjust_stock(tx, kind, item_id, quantity).await?;
    }

    Ok(())
}

/// Catalog item an order line points at, if it still exists
pub(crate) fn line_item_ref(
    item_kind: &str,
    product_id: Option<Uuid>,
    supply_id: Option<Uuid>,
) -> Option<(CatalogKind, Uuid)> {
    match CatalogKind::from_str(item_kind)? {
        CatalogKind::Product => product_id.map(|id| (CatalogKind::Product, id)),
        CatalogKind::Supply => supply_id.map(|id| (CatalogKind::Supply, id)),
    }
}
