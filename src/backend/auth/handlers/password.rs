/**
 * Password Change Handler
 *
 * `POST /api/auth/change-password`, behind the auth middleware.
 *
 * The current password must verify (401 otherwise). Existing tokens stay
 * valid until they expire.
 */

use axum::{extract::State, response::Json};
use bcrypt::{hash, verify, DEFAULT_COST};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::ChangePasswordRequest;
use crate::backend::auth::users::{get_user_by_id, update_password};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;

pub async fn change_password(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    let record = get_user_by_id(&pool, user.user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    let valid = verify(&request.current_password, &record.password_hash).map_err(|e| {
        tracing::error!("Failed to verify password: {:?}", e);
        BackendError::internal("Server error")
    })?;
    if !valid {
        tracing::warn!("Wrong current password for {}", record.email);
        return Err(BackendError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash(&request.new_password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::internal("Server error")
    })?;
    update_password(&pool, record.id, &password_hash).await?;

    tracing::info!("Password changed for {}", record.email);
    Ok(Json(json!({ "message": "Password updated" })))
}
