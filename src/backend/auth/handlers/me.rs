/**
 * Current User Handler
 *
 * `GET /api/auth/me`, behind the auth middleware.
 */

use axum::{extract::State, response::Json};
use sqlx::PgPool;

use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::require_pool;
use crate::shared::UserProfile;

pub async fn get_me(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
) -> Result<Json<UserProfile>, BackendError> {
    let pool = require_pool(pool)?;

    let record = get_user_by_id(&pool, user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User not found: {}", user.user_id);
        BackendError::not_found("User not found")
    })?;

    Ok(Json(record.profile()))
}
