/**
 * Cart Queries
 *
 * A cart line references exactly one catalog item through the column of its
 * kind (`product_id` or `supply_id`).
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::orders::placement::line_item_ref;
use crate::shared::cart::{CartEntry, CartItemKey, CartItemRequest};
use crate::shared::CatalogKind;

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    item_kind: String,
    product_id: Option<Uuid>,
    supply_id: Option<Uuid>,
    quantity: i32,
    name: Option<String>,
    brand: Option<String>,
    price_cents: Option<i64>,
    stock: Option<i32>,
}

impl CartRow {
    fn into_entry(self) -> Option<CartEntry> {
        let (kind, item_id) = line_item_ref(&self.item_kind, self.product_id, self.supply_id)?;
        Some(CartEntry {
            id: self.id,
            item_id,
            kind,
            name: self.name?,
            brand: self.brand.unwrap_or_default(),
            price_cents: self.price_cents?,
            stock: self.stock.unwrap_or(0),
            quantity: self.quantity,
        })
    }
}

/// Cart lines with current catalog name, price and stock, oldest first
pub async fn list_cart(pool: &PgPool, user_id: Uuid) -> Result<Vec<CartEntry>, sqlx::Error> {
    let rows: Vec<CartRow> = sqlx::query_as(
        r#"
        SELECT c.id, c.item_kind, c.product_id, c.supply_id, c.quantity,
               COALESCE(p.name, s.name) AS name,
               COALESCE(p.brand, s.brand) AS brand,
               COALESCE(p.price_cents, s.price_cents) AS price_cents,
               COALESCE(p.stock, s.stock) AS stock
        FROM cart_items c
        LEFT JOIN products p ON p.id = c.product_id
        LEFT JOIN supplies s ON s.id = c.supply_id
        WHERE c.user_id = $1
        ORDER BY c.created_at, c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(CartRow::into_entry).collect())
}

pub async fn item_exists(pool: &PgPool, kind: CatalogKind, item_id: Uuid) -> Result<bool, sqlx::Error> {
    let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", kind.table());
    sqlx::query_scalar(&sql).bind(item_id).fetch_one(pool).await
}

/// Add to the cart; an item already in the cart has its quantity increased
///
/// A single upsert against the partial unique index of the item's kind, so
/// concurrent adds of the same item end up on one line.
pub async fn add_item(
    pool: &PgPool,
    user_id: Uuid,
    request: &CartItemRequest,
) -> Result<(), sqlx::Error> {
    let column = request.kind.reference_column();

    let sql = format!(
        r#"
        INSERT INTO cart_items (user_id, item_kind, {column}, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, {column}) WHERE {column} IS NOT NULL
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        "#,
        column = column
    );

    sqlx::query(&sql)
        .bind(user_id)
        .bind(request.kind.as_str())
        .bind(request.item_id)
        .bind(request.quantity)
        .execute(pool)
        .await?;

    Ok(())
}

/// `false` when the item is not in the cart
pub async fn set_quantity(
    pool: &PgPool,
    user_id: Uuid,
    request: &CartItemRequest,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "UPDATE cart_items SET quantity = $1 WHERE user_id = $2 AND {} = $3",
        request.kind.reference_column()
    );

    let result = sqlx::query(&sql)
        .bind(request.quantity)
        .bind(user_id)
        .bind(request.item_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove_item(pool: &PgPool, user_id: Uuid, key: &CartItemKey) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM cart_items WHERE user_id = $1 AND {} = $2",
        key.kind.reference_column()
    );

    let result = sqlx::query(&sql)
        .bind(user_id)
        .bind(key.item_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
