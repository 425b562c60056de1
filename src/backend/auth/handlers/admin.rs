/**
 * Admin User Management
 *
 * # Endpoints
 *
 * - `GET /api/admin/users?role=&search=` - List accounts
 * - `PUT /api/admin/users/{id}` - Edit names, phone or role
 * - `DELETE /api/admin/users/{id}` - Remove an account
 *
 * Promoting a client to `supplier` is how an existing account starts
 * selling. Admins cannot change their own role or delete themselves, so the
 * platform always keeps the admin performing the action. Edits and
 * deletions are written to the activity log.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::activity::log_admin_activity;
use crate::backend::auth::users::{self, get_user_by_id};
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::{AdminAction, Role, UserListQuery, UserProfile, UserUpdate};

pub async fn list_users(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<UserProfile>>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let found = users::list_users(&pool, &query).await?;
    Ok(Json(found.iter().map(|u| u.profile()).collect()))
}

pub async fn update_user(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserProfile>, BackendError> {
    update.validate()?;
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let before = get_user_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    if user_id == user.user_id && update.role.is_some_and(|role| role != before.role()) {
        return Err(BackendError::conflict("You cannot change your own role"));
    }

    let updated = users::update_user(&pool, user_id, &update)
        .await
        .map_err(|e| {
            let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
            if duplicate {
                BackendError::conflict("Phone already registered")
            } else {
                BackendError::from(e)
            }
        })?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    tracing::info!("Admin {} updated user {}", user.user_id, user_id);
    log_admin_activity(
        &pool,
        user.user_id,
        AdminAction::UserUpdated,
        "user",
        &user_id.to_string(),
        json!({
            "email": updated.email,
            "from_role": before.role(),
            "to_role": updated.role(),
            "changes": update,
        }),
    )
    .await;

    Ok(Json(updated.profile()))
}

pub async fn delete_user(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, BackendError> {
    user.require_role(&[Role::Admin])?;
    if user_id == user.user_id {
        return Err(BackendError::conflict("You cannot delete your own account"));
    }
    let pool = require_pool(pool)?;

    let deleted = users::delete_user(&pool, user_id)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    log_admin_activity(
        &pool,
        user.user_id,
        AdminAction::UserDeleted,
        "user",
        &user_id.to_string(),
        json!({
            "email": deleted.email,
            "name": deleted.full_name(),
            "role": deleted.role(),
        }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
