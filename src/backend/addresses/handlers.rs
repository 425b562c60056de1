//! Address handlers: `GET|POST /api/addresses`, `PUT|DELETE /api/addresses/{id}`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sqlx::PgPool;

use crate::backend::addresses::db;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::address::{Address, AddressInput};

pub async fn list_addresses(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Address>>, BackendError> {
    let pool = require_pool(pool)?;
    Ok(Json(db::list_addresses(&pool, user.user_id).await?))
}

pub async fn create_address(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<Address>), BackendError> {
    input.validate()?;
    let pool = require_pool(pool)?;

    let address = db::create_address(&pool, user.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(input): Json<AddressInput>,
) -> Result<Json<Address>, BackendError> {
    input.validate()?;
    let pool = require_pool(pool)?;

    db::update_address(&pool, id, user.user_id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Address not found"))
}

pub async fn delete_address(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, BackendError> {
    let pool = require_pool(pool)?;

    if !db::delete_address(&pool, id, user.user_id).await? {
        return Err(BackendError::not_found("Address not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
