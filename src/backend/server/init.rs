/**
 * Server Initialization
 *
 * Builds the Axum application:
 * 1. Load the database pool (optional) and run migrations
 * 2. Create the application state
 * 3. Create the router with all routes and middleware
 */

use axum::Router;

use crate::backend::routes::router::create_router;
use crate::backend::server::config::{load_database, AppConfig};
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
///
/// A missing database does not prevent startup; database-backed endpoints
/// answer `503` until the server is restarted with a reachable database.
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("Initializing brewmarket backend server");

    let db_pool = load_database(&config).await;
    if db_pool.is_none() {
        tracing::warn!("Starting without a database");
    }

    let app_state = AppState::new(config, db_pool);
    let app = create_router(app_state);

    tracing::info!("Router configured");

    app
}
