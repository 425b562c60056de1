//! Notification handlers
//!
//! - `GET /api/notifications`
//! - `PUT /api/notifications/read-all`
//! - `DELETE /api/notifications/{id}`

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::db;
use crate::backend::server::state::require_pool;
use crate::shared::notification::Notification;

pub async fn list_notifications(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Notification>>, BackendError> {
    let pool = require_pool(pool)?;
    Ok(Json(db::list_notifications(&pool, user.user_id).await?))
}

pub async fn mark_all_read(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, BackendError> {
    let pool = require_pool(pool)?;

    let updated = db::mark_all_read(&pool, user.user_id).await?;
    Ok(Json(json!({ "updated": updated })))
}

pub async fn delete_notification(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, BackendError> {
    let pool = require_pool(pool)?;

    if !db::delete_notification(&pool, id, user.user_id).await? {
        return Err(BackendError::not_found("Notification not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
