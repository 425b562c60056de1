/**
 * Router Configuration
 *
 * Combines the API routes with the cross-cutting layers:
 * 1. API routes (public and authenticated)
 * 2. JSON 404 fallback
 * 3. CORS for the configured frontend origin
 * 4. Request tracing
 */

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Invalid frontend origin {}: {:?}; CORS disabled", frontend_url, e);
            cors
        }
    }
}

/// Create the Axum router with all routes and layers configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_api_routes(Router::new(), app_state.clone());

    let router = router.fallback(|| async { BackendError::not_found("Route not found") });

    router
        .layer(cors_layer(&app_state.config.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
