/**
 * API Routes
 *
 * # Public
 * - `GET /api/health`
 * - `POST /api/auth/register`, `POST /api/auth/login`
 * - `GET /api/catalog/{kind}`, `GET /api/catalog/{kind}/{id}`
 * - `GET /api/reviews/{kind}/{item_id}`
 * - `POST /api/supplier-requests`, `POST /api/supplier-requests/validate`
 *
 * # Authenticated (behind `auth_middleware`)
 * - `GET /api/auth/me`, `POST /api/auth/change-password`
 * - `/api/supplier/catalog/...` - supplier catalog management
 * - `/api/cart`, `/api/addresses`, `/api/notifications`
 * - `/api/orders/...` - buyer, admin and supplier order endpoints
 * - `POST /api/reviews`
 * - `/api/admin/...` - users, supplier requests, activity log
 *
 * Role checks happen inside the handlers.
 */

use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::backend::activity::handlers as activity;
use crate::backend::addresses::handlers as addresses;
use crate::backend::auth::handlers::admin as users;
use crate::backend::auth::{change_password, get_me, login, register};
use crate::backend::cart::handlers as cart;
use crate::backend::catalog::handlers as catalog;
use crate::backend::middleware::auth_middleware;
use crate::backend::notifications::handlers as notifications;
use crate::backend::orders::handlers as orders;
use crate::backend::reviews::handlers as reviews;
use crate::backend::server::state::AppState;
use crate::backend::supplier_requests::handlers as supplier_requests;

/// `GET /api/health`
pub async fn health(State(pool): State<Option<PgPool>>) -> Json<Value> {
    let database = match &pool {
        Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
        None => false,
    };

    Json(json!({ "status": "ok", "database": database }))
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/catalog/{kind}", get(catalog::list_items))
        .route("/api/catalog/{kind}/{id}", get(catalog::get_item))
        .route("/api/reviews/{kind}/{item_id}", get(reviews::list_reviews))
        .route("/api/supplier-requests", post(supplier_requests::submit_request))
        .route(
            "/api/supplier-requests/validate",
            post(supplier_requests::check_availability),
        )
}

fn protected_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(get_me))
        .route("/api/auth/change-password", post(change_password))
        // Supplier catalog management
        .route(
            "/api/supplier/catalog/{kind}",
            get(catalog::list_own_items).post(catalog::create_item),
        )
        .route(
            "/api/supplier/catalog/{kind}/{id}",
            put(catalog::update_item).delete(catalog::delete_item),
        )
        .route("/api/supplier/catalog/{kind}/{id}/stock", put(catalog::update_stock))
        // Cart
        .route(
            "/api/cart",
            get(cart::get_cart)
                .post(cart::add_to_cart)
                .put(cart::update_cart_item)
                .delete(cart::remove_from_cart),
        )
        .route("/api/cart/clear", delete(cart::clear_cart))
        // Addresses
        .route(
            "/api/addresses",
            get(addresses::list_addresses).post(addresses::create_address),
        )
        .route(
            "/api/addresses/{id}",
            put(addresses::update_address).delete(addresses::delete_address),
        )
        // Orders
        .route("/api/orders", post(orders::place_order))
        .route("/api/orders/mine", get(orders::list_my_orders))
        .route("/api/orders/{id}", get(orders::get_my_order))
        .route("/api/orders/{id}/cancel", put(orders::cancel_order))
        .route("/api/orders/admin/all", get(orders::list_all_orders))
        .route(
            "/api/orders/admin/{id}",
            get(orders::get_any_order)
                .put(orders::update_any_order)
                .delete(orders::delete_any_order),
        )
        .route("/api/orders/supplier/mine", get(orders::list_supplier_orders))
        .route(
            "/api/orders/supplier/{id}",
            get(orders::get_supplier_order).put(orders::update_supplier_order),
        )
        // Reviews
        .route("/api/reviews", post(reviews::create_review))
        // Admin
        .route("/api/admin/users", get(users::list_users))
        .route(
            "/api/admin/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route("/api/admin/supplier-requests", get(supplier_requests::list_requests))
        .route(
            "/api/admin/supplier-requests/{id}/status",
            put(supplier_requests::decide_request),
        )
        .route("/api/admin/activity", get(activity::list_activity))
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/read-all", put(notifications::mark_all_read))
        .route("/api/notifications/{id}", delete(notifications::delete_notification))
        .route_layer(from_fn_with_state(app_state, auth_middleware))
}

/// Add every API route to `router`
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    router
        .merge(public_routes())
        .merge(protected_routes(app_state))
}
