/**
 * Catalog HTTP Handlers
 *
 * `{kind}` is `product(s)` or `supply`/`supplies`.
 *
 * Public:
 * - `GET /api/catalog/{kind}` - in-stock items
 * - `GET /api/catalog/{kind}/{id}` - one item
 *
 * Supplier (own items only, 404 for anything else):
 * - `GET|POST /api/supplier/catalog/{kind}`
 * - `PUT|DELETE /api/supplier/catalog/{kind}/{id}`
 * - `PUT /api/supplier/catalog/{kind}/{id}/stock`
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::catalog::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::{CatalogItem, CatalogItemInput, CatalogKind, Role, StockUpdate};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

fn item_not_found(kind: CatalogKind) -> BackendError {
    BackendError::not_found(format!("No such {}", kind))
}

pub async fn list_items(
    State(pool): State<Option<PgPool>>,
    Path(kind): Path<CatalogKind>,
) -> Result<Json<Vec<CatalogItem>>, BackendError> {
    let pool = require_pool(pool)?;
    Ok(Json(db::list_available(&pool, kind).await?))
}

pub async fn get_item(
    State(pool): State<Option<PgPool>>,
    Path((kind, id)): Path<(CatalogKind, Uuid)>,
) -> Result<Json<CatalogItem>, BackendError> {
    let pool = require_pool(pool)?;

    db::get_item(&pool, kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(kind))
}

pub async fn list_own_items(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(kind): Path<CatalogKind>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<CatalogItem>>, BackendError> {
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    let items = db::list_supplier_items(&pool, kind, user.user_id, query.search.as_deref()).await?;
    Ok(Json(items))
}

pub async fn create_item(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(kind): Path<CatalogKind>,
    Json(input): Json<CatalogItemInput>,
) -> Result<(StatusCode, Json<CatalogItem>), BackendError> {
    input.validate()?;
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    let item = db::create_item(&pool, kind, user.user_id, &input).await?;
    tracing::info!("Supplier {} created {} {}", user.user_id, kind, item.id);

    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(CatalogKind, Uuid)>,
    Json(input): Json<CatalogItemInput>,
) -> Result<Json<CatalogItem>, BackendError> {
    input.validate()?;
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    db::update_item(&pool, kind, id, user.user_id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| item_not_found(kind))
}

pub async fn update_stock(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(CatalogKind, Uuid)>,
    Json(update): Json<StockUpdate>,
) -> Result<Json<CatalogItem>, BackendError> {
    update.validate()?;
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    let item = db::set_stock(&pool, kind, id, user.user_id, update.stock)
        .await?
        .ok_or_else(|| item_not_found(kind))?;

    tracing::info!("Stock of {} {} set to {}", kind, id, item.stock);
    Ok(Json(item))
}

pub async fn delete_item(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(CatalogKind, Uuid)>,
) -> Result<StatusCode, BackendError> {
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    if !db::delete_item(&pool, kind, id, user.user_id).await? {
        return Err(item_not_found(kind));
    }

    tracing::info!("Supplier {} deleted {} {}", user.user_id, kind, id);
    Ok(StatusCode::NO_CONTENT)
}
