/**
 * Application State Management
 *
 * `AppState` is the central state container shared by every handler. It
 * holds the optional database pool and the immutable configuration.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only what they need:
 *
 * ```rust,ignore
 * async fn handler(State(pool): State<Option<PgPool>>) { /* ... */ }
 * async fn handler(State(config): State<Arc<AppConfig>>) { /* ... */ }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::error::BackendError;
use crate::backend::server::config::AppConfig;

/// Application state shared across handlers
///
/// # Fields
///
/// * `db_pool` - PostgreSQL connection pool, `None` when the database is off
/// * `config` - Server configuration
#[derive(Clone)]
pub struct AppState {
    pub db_pool: Option<PgPool>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            db_pool,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}

/// Unwrap the optional pool, answering `503` when no database is configured
pub fn require_pool(pool: Option<PgPool>) -> Result<PgPool, BackendError> {
    pool.ok_or_else(|| {
        tracing::error!("Database not configured");
        BackendError::DatabaseUnavailable
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_require_pool_without_database() {
        let err = require_pool(None).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_config_projection() {
        let state = AppState::new(AppConfig::default(), None);
        let config: Arc<AppConfig> = Arc::from_ref(&state);
        assert_eq!(config.low_stock_threshold, 10);
        assert!(Option::<PgPool>::from_ref(&state).is_none());
    }
}
