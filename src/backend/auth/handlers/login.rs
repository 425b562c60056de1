/**
 * Login Handler
 *
 * `POST /api/auth/login`
 *
 * Unknown email and wrong password produce the same 401 so accounts cannot
 * be enumerated.
 */

use std::sync::Arc;

use axum::{extract::State, response::Json};
use bcrypt::verify;
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{normalize_email, AuthResponse, LoginRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::get_user_by_email;
use crate::backend::error::BackendError;
use crate::backend::server::config::AppConfig;
use crate::backend::server::state::require_pool;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn login(
    State(pool): State<Option<PgPool>>,
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, BackendError> {
    let pool = require_pool(pool)?;

    let email = normalize_email(&request.email);
    tracing::info!("Login request for {}", email);

    let user = get_user_by_email(&pool, &email).await?.ok_or_else(|| {
        tracing::warn!("Login for unknown email {}", email);
        BackendError::unauthorized(INVALID_CREDENTIALS)
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("Failed to verify password: {:?}", e);
        BackendError::internal("Server error")
    })?;
    if !valid {
        tracing::warn!("Wrong password for {}", email);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = create_token(&config, user.id, &user.email, user.role()).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::internal("Server error")
    })?;

    tracing::info!("User logged in: {}", user.email);

    Ok(Json(AuthResponse {
        token,
        user: user.profile(),
    }))
}
