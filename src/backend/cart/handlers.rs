/**
 * Cart HTTP Handlers
 *
 * - `GET /api/cart`
 * - `POST /api/cart` - add `{item_id, kind, quantity}`
 * - `PUT /api/cart` - set quantity
 * - `DELETE /api/cart` - remove `{item_id, kind}`
 * - `DELETE /api/cart/clear`
 *
 * Mutations answer with the updated cart.
 */

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::cart::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::cart::{CartEntry, CartItemKey, CartItemRequest};

pub async fn get_cart(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CartEntry>>, BackendError> {
    let pool = require_pool(pool)?;
    Ok(Json(db::list_cart(&pool, user.user_id).await?))
}

pub async fn add_to_cart(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<Vec<CartEntry>>, BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    if !db::item_exists(&pool, request.kind, request.item_id).await? {
        return Err(BackendError::not_found(format!("No such {}", request.kind)));
    }

    db::add_item(&pool, user.user_id, &request).await?;
    Ok(Json(db::list_cart(&pool, user.user_id).await?))
}

pub async fn update_cart_item(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CartItemRequest>,
) -> Result<Json<Vec<CartEntry>>, BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    if !db::set_quantity(&pool, user.user_id, &request).await? {
        return Err(BackendError::not_found("Item is not in the cart"));
    }

    Ok(Json(db::list_cart(&pool, user.user_id).await?))
}

pub async fn remove_from_cart(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(key): Json<CartItemKey>,
) -> Result<Json<Vec<CartEntry>>, BackendError> {
    let pool = require_pool(pool)?;

    if !db::remove_item(&pool, user.user_id, &key).await? {
        return Err(BackendError::not_found("Item is not in the cart"));
    }

    Ok(Json(db::list_cart(&pool, user.user_id).await?))
}

pub async fn clear_cart(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CartEntry>>, BackendError> {
    let pool = require_pool(pool)?;

    let removed = db::clear_cart(&pool, user.user_id).await?;
    tracing::debug!("Cleared {} cart lines for {}", removed, user.user_id);

    Ok(Json(Vec::new()))
}
