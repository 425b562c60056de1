/**
 * Order HTTP Handlers
 *
 * # Endpoints
 *
 * Buyer:
 * - `POST /api/orders` - Place an order (201 with `{order_id}`)
 * - `GET /api/orders/mine` - Own orders, filterable
 * - `GET /api/orders/{id}` - One own order
 * - `PUT /api/orders/{id}/cancel` - Cancel a pending own order
 *
 * Admin:
 * - `GET /api/orders/admin/all`
 * - `GET|PUT|DELETE /api/orders/admin/{id}`
 *
 * Supplier:
 * - `GET /api/orders/supplier/mine`
 * - `GET|PUT /api/orders/supplier/{id}` - Only orders with the supplier's
 *   items; the detail carries only the supplier's lines
 *
 * Admin status changes and deletions are written to the activity log.
 *
 * Every handler validates its input first, then checks the caller's role,
 * then requires the database.
 */

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::backend::activity::log_admin_activity;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::orders::db::{self, OrderScope};
use crate::backend::orders::placement;
use crate::backend::server::config::AppConfig;
use crate::backend::server::state::require_pool;
use crate::shared::{
    OrderDetail, OrderFilters, OrderStatusUpdate, OrderSummary, PlaceOrderRequest,
    AdminAction, PlacedOrderResponse, Role,
};

pub async fn place_order(
    State(pool): State<Option<PgPool>>,
    State(config): State<Arc<AppConfig>>,
    AuthUser(user): AuthUser,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    let placed =
        placement::place_order(&pool, user.user_id, &request, config.low_stock_threshold).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            order_id: placed.order_id,
        }),
    ))
}

pub async fn cancel_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>, BackendError> {
    let pool = require_pool(pool)?;

    placement::cancel_order(&pool, order_id, user.user_id).await?;

    Ok(Json(json!({ "message": "Order cancelled", "order_id": order_id })))
}

pub async fn list_my_orders(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<Vec<OrderSummary>>, BackendError> {
    filters.validate()?;
    let pool = require_pool(pool)?;

    let orders = db::list_orders(&pool, OrderScope::Owner(user.user_id), &filters).await?;
    Ok(Json(orders))
}

pub async fn get_my_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetail>, BackendError> {
    let pool = require_pool(pool)?;

    db::find_order(&pool, order_id, OrderScope::Owner(user.user_id))
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Order not found"))
}

pub async fn list_all_orders(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<Vec<OrderSummary>>, BackendError> {
    filters.validate()?;
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let orders = db::list_orders(&pool, OrderScope::All, &filters).await?;
    Ok(Json(orders))
}

pub async fn get_any_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetail>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    db::find_order(&pool, order_id, OrderScope::All)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Order not found"))
}

pub async fn update_any_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
    Json(update): Json<OrderStatusUpdate>,
) -> Result<Json<Value>, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let change = db::update_order_status(&pool, order_id, &update).await?;

    log_admin_activity(
        &pool,
        user.user_id,
        AdminAction::OrderStatusUpdated,
        "order",
        &order_id.to_string(),
        json!({
            "order_id": order_id,
            "customer_name": change.customer_name,
            "from_status": change.from,
            "to_status": change.to,
        }),
    )
    .await;

    Ok(Json(json!({ "message": "Order updated", "status": change.to })))
}

pub async fn delete_any_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<StatusCode, BackendError> {
    user.require_role(&[Role::Admin])?;
    let pool = require_pool(pool)?;

    let deleted = db::delete_order(&pool, order_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Order not found"))?;

    tracing::info!("Order {} deleted by admin {}", order_id, user.user_id);
    log_admin_activity(
        &pool,
        user.user_id,
        AdminAction::OrderDeleted,
        "order",
        &order_id.to_string(),
        json!({
            "order_id": order_id,
            "customer_name": deleted.customer_name,
            "status": deleted.status,
            "stock_restored": deleted.stock_restored,
        }),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_supplier_orders(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Query(filters): Query<OrderFilters>,
) -> Result<Json<Vec<OrderSummary>>, BackendError> {
    filters.validate()?;
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    let orders = db::list_orders(&pool, OrderScope::Supplier(user.user_id), &filters).await?;
    Ok(Json(orders))
}

pub async fn get_supplier_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDetail>, BackendError> {
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    db::find_order(&pool, order_id, OrderScope::Supplier(user.user_id))
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Order not found"))
}

pub async fn update_supplier_order(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Path(order_id): Path<i64>,
    Json(update): Json<OrderStatusUpdate>,
) -> Result<Json<Value>, BackendError> {
    user.require_role(&[Role::Supplier])?;
    let pool = require_pool(pool)?;

    let change = db::update_supplier_order(&pool, order_id, user.user_id, &update).await?;

    Ok(Json(json!({ "message": "Order updated", "status": change.to })))
}
