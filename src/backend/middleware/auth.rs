/**
 * Authentication Middleware
 *
 * Protects routes that require a signed-in user. The middleware verifies the
 * `Authorization: Bearer <token>` header and stores the caller in the request
 * extensions; handlers read it back through the `AuthUser` extractor and
 * gate role-specific operations with `require_role`.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::Role;

/// Caller identity taken from a verified token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthenticatedUser {
    /// `403 Forbidden` unless the caller has one of `allowed`
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), BackendError> {
        if allowed.contains(&self.role) {
            return Ok(());
        }

        tracing::warn!(
            "User {} with role {} denied; requires one of {:?}",
            self.user_id,
            self.role,
            allowed
        );
        Err(BackendError::forbidden("You do not have permission to do this"))
    }
}

/// Authentication middleware
///
/// 1. Extracts the bearer token from the Authorization header
/// 2. Verifies signature and expiry
/// 3. Attaches an `AuthenticatedUser` to the request extensions
///
/// Returns 401 Unauthorized if the token is missing or invalid. When a
/// database is configured the user must still exist, and its stored role
/// replaces the one in the token.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            BackendError::unauthorized("Authentication required")
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        BackendError::unauthorized("Authentication required")
    })?;

    let claims = verify_token(&app_state.config, token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
        tracing::warn!("Invalid user ID in token: {:?}", e);
        BackendError::unauthorized("Invalid or expired token")
    })?;

    // With a database the stored role wins, so role changes apply at once
    let mut role = claims.role;
    if let Some(pool) = &app_state.db_pool {
        let user = crate::backend::auth::users::get_user_by_id(pool, user_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Token for unknown user {}", user_id);
                BackendError::unauthorized("Invalid or expired token")
            })?;
        role = user.role();
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        email: claims.email,
        role,
    });

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated caller
///
/// Only usable behind `auth_middleware`; otherwise it rejects with 401.
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Authentication required")
            })
    }
}
