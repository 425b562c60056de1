/**
 * Register Handler
 *
 * `POST /api/auth/register`
 *
 * # Registration Process
 *
 * 1. Validate names, phone, email and password strength
 * 2. Reject a taken email or phone with 409
 * 3. Hash the password using bcrypt
 * 4. Create the user; the configured admin email gets the admin role
 * 5. Return a token and the profile
 */

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, DEFAULT_COST};
use sqlx::PgPool;

use crate::backend::auth::handlers::types::{normalize_email, AuthResponse, RegisterRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_phone, NewUser};
use crate::backend::error::BackendError;
use crate::backend::server::config::AppConfig;
use crate::backend::server::state::require_pool;
use crate::shared::Role;

/// Role a new account receives
pub fn role_for_email(email: &str, config: &AppConfig) -> Role {
    match &config.admin_email {
        Some(admin) if normalize_email(admin) == email => Role::Admin,
        _ => Role::Client,
    }
}

pub async fn register(
    State(pool): State<Option<PgPool>>,
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    let email = normalize_email(&request.email);
    tracing::info!("Register request for {}", email);

    if get_user_by_email(&pool, &email).await?.is_some() {
        tracing::warn!("Email already registered: {}", email);
        return Err(BackendError::conflict("Email already registered"));
    }
    if get_user_by_phone(&pool, &request.phone).await?.is_some() {
        tracing::warn!("Phone already registered: {}", request.phone);
        return Err(BackendError::conflict("Phone already registered"));
    }

    let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::internal("Server error")
    })?;

    let role = role_for_email(&email, &config);
    let user = create_user(
        &pool,
        NewUser {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            phone: request.phone.clone(),
            email,
            password_hash,
            role,
        },
    )
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration
        let duplicate = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
        if duplicate {
            BackendError::conflict("Email or phone already registered")
        } else {
            BackendError::from(e)
        }
    })?;

    let token = create_token(&config, user.id, &user.email, user.role()).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::internal("Server error")
    })?;

    tracing::info!("User created: {} ({})", user.email, user.role);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.profile(),
        }),
    ))
}
