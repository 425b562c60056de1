//! Review handlers
//!
//! - `POST /api/reviews` - Review a line of an own delivered order (201)
//! - `GET /api/reviews/{kind}/{item_id}` - Public reviews of an item

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::reviews::db::{self, ReviewOutcome};
use crate::backend::server::state::require_pool;
use crate::shared::{CatalogKind, Review, ReviewRequest};

pub async fn create_review(
    State(pool): State<Option<PgPool>>,
    AuthUser(user): AuthUser,
    Json(request): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<Review>), BackendError> {
    request.validate()?;
    let pool = require_pool(pool)?;

    match db::create_review(&pool, user.user_id, &request).await? {
        ReviewOutcome::Created(review) => {
            tracing::info!("User {} reviewed order line {}", user.user_id, request.order_item_id);
            Ok((StatusCode::CREATED, Json(review)))
        }
        ReviewOutcome::LineNotFound => Err(BackendError::not_found("Order item not found")),
        ReviewOutcome::NotOwner => Err(BackendError::forbidden("You can only review your own orders")),
        ReviewOutcome::NotDelivered(status) => Err(BackendError::forbidden(format!(
            "You can only review delivered orders; this one is {}",
            status
        ))),
        ReviewOutcome::ItemRemoved => Err(BackendError::conflict("This item is no longer available")),
        ReviewOutcome::AlreadyReviewed => Err(BackendError::conflict("You already reviewed this item")),
    }
}

pub async fn list_reviews(
    State(pool): State<Option<PgPool>>,
    Path((kind, item_id)): Path<(CatalogKind, Uuid)>,
) -> Result<Json<Vec<Review>>, BackendError> {
    let pool = require_pool(pool)?;
    Ok(Json(db::list_reviews(&pool, kind, item_id).await?))
}
