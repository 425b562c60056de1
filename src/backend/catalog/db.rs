/**
 * Catalog Queries
 *
 * Products and supplies share one shape, so every query is written once and
 * pointed at the table of the requested `CatalogKind`. Supplier-side
 * mutations are always scoped to the caller's own items.
 */

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::shared::{CatalogItem, CatalogItemInput, CatalogKind};

const ITEM_COLUMNS: &str =
    "id, supplier_id, name, category, brand, description, price_cents, stock, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CatalogRow {
    id: Uuid,
    supplier_id: Uuid,
    name: String,
    category: String,
    brand: String,
    description: String,
    price_cents: i64,
    stock: i32,
    created_at: DateTime<Utc>,
}

impl CatalogRow {
    fn into_item(self, kind: CatalogKind) -> CatalogItem {
        CatalogItem {
            id: self.id,
            kind,
            supplier_id: self.supplier_id,
            name: self.name,
            category: self.category,
            brand: self.brand,
            description: self.description,
            price_cents: self.price_cents,
            stock: self.stock,
            created_at: self.created_at,
        }
    }
}

/// In-stock items, newest first
pub async fn list_available(pool: &PgPool, kind: CatalogKind) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM {} WHERE stock > 0 ORDER BY created_at DESC",
        ITEM_COLUMNS,
        kind.table()
    );

    let rows: Vec<CatalogRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| r.into_item(kind)).collect())
}

pub async fn get_item(
    pool: &PgPool,
    kind: CatalogKind,
    id: Uuid,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let sql = format!("SELECT {} FROM {} WHERE id = $1", ITEM_COLUMNS, kind.table());

    let row: Option<CatalogRow> = sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?;
    Ok(row.map(|r| r.into_item(kind)))
}

/// A supplier's own items, optionally filtered by name or brand
pub async fn list_supplier_items(
    pool: &PgPool,
    kind: CatalogKind,
    supplier_id: Uuid,
    search: Option<&str>,
) -> Result<Vec<CatalogItem>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM {} WHERE supplier_id = ", ITEM_COLUMNS, kind.table()));
    query.push_bind(supplier_id);

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR brand ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    query.push(" ORDER BY created_at DESC");

    let rows: Vec<CatalogRow> = query.build_query_as().fetch_all(pool).await?;
    Ok(rows.into_iter().map(|r| r.into_item(kind)).collect())
}

pub async fn create_item(
    pool: &PgPool,
    kind: CatalogKind,
    supplier_id: Uuid,
    input: &CatalogItemInput,
) -> Result<CatalogItem, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (id, supplier_id, name, category, brand, description, price_cents, stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {}
        "#,
        kind.table(),
        ITEM_COLUMNS
    );

    let row: CatalogRow = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(supplier_id)
        .bind(input.name.trim())
        .bind(input.category.trim())
        .bind(input.brand.trim())
        .bind(input.description.trim())
        .bind(input.price_cents)
        .bind(input.stock)
        .fetch_one(pool)
        .await?;

    Ok(row.into_item(kind))
}

/// Replace an owned item's fields; `None` when the supplier owns no such item
pub async fn update_item(
    pool: &PgPool,
    kind: CatalogKind,
    id: Uuid,
    supplier_id: Uuid,
    input: &CatalogItemInput,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE {}
        SET name = $1, category = $2, brand = $3, description = $4,
            price_cents = $5, stock = $6, updated_at = NOW()
        WHERE id = $7 AND supplier_id = $8
        RETURNING {}
        "#,
        kind.table(),
        ITEM_COLUMNS
    );

    let row: Option<CatalogRow> = sqlx::query_as(&sql)
        .bind(input.name.trim())
        .bind(input.category.trim())
        .bind(input.brand.trim())
        .bind(input.description.trim())
        .bind(input.price_cents)
        .bind(input.stock)
        .bind(id)
        .bind(supplier_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into_item(kind)))
}

pub async fn set_stock(
    pool: &PgPool,
    kind: CatalogKind,
    id: Uuid,
    supplier_id: Uuid,
    stock: i32,
) -> Result<Option<CatalogItem>, sqlx::Error> {
    let sql = format!(
        "UPDATE {} SET stock = $1, updated_at = NOW() WHERE id = $2 AND supplier_id = $3 RETURNING {}",
        kind.table(),
        ITEM_COLUMNS
    );

    let row: Option<CatalogRow> = sqlx::query_as(&sql)
        .bind(stock)
        .bind(id)
        .bind(supplier_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|r| r.into_item(kind)))
}

/// `false` when the supplier owns no such item
pub async fn delete_item(
    pool: &PgPool,
    kind: CatalogKind,
    id: Uuid,
    supplier_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!("DELETE FROM {} WHERE id = $1 AND supplier_id = $2", kind.table());

    let result = sqlx::query(&sql).bind(id).bind(supplier_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
