/**
 * Review Queries
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::backend::orders::placement::line_item_ref;
use crate::shared::{CatalogKind, OrderStatus, Review, ReviewRequest};

/// Why a line cannot be reviewed, or the stored review
#[derive(Debug)]
pub enum ReviewOutcome {
    LineNotFound,
    /// The line belongs to someone else's order
    NotOwner,
    NotDelivered(OrderStatus),
    /// The catalog item was removed after the purchase
    ItemRemoved,
    AlreadyReviewed,
    Created(Review),
}

/// Review one line of a delivered order of `user_id`
pub async fn create_review(
    pool: &PgPool,
    user_id: Uuid,
    request: &ReviewRequest,
) -> Result<ReviewOutcome, sqlx::Error> {
    let line: Option<(Uuid, String, String, Option<Uuid>, Option<Uuid>)> = sqlx::query_as(
        r#"
        SELECT o.user_id, o.status, oi.item_kind, oi.product_id, oi.supply_id
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        WHERE oi.id = $1
        "#,
    )
    .bind(request.order_item_id)
    .fetch_optional(pool)
    .await?;

    let Some((owner, status, item_kind, product_id, supply_id)) = line else {
        return Ok(ReviewOutcome::LineNotFound);
    };
    if owner != user_id {
        return Ok(ReviewOutcome::NotOwner);
    }
    let status: OrderStatus = status.parse().map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    if status != OrderStatus::Delivered {
        return Ok(ReviewOutcome::NotDelivered(status));
    }
    let Some((kind, item_id)) = line_item_ref(&item_kind, product_id, supply_id) else {
        return Ok(ReviewOutcome::ItemRemoved);
    };

    let sql = format!(
        r#"
        WITH inserted AS (
            INSERT INTO reviews (user_id, order_item_id, item_kind, {column}, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, rating, comment, created_at
        )
        SELECT i.id, u.first_name || ' ' || u.last_name AS reviewer_name, i.rating, i.comment, i.created_at
        FROM inserted i
        JOIN users u ON u.id = i.user_id
        "#,
        column = kind.reference_column()
    );

    let comment = request
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let inserted = sqlx::query_as::<_, Review>(&sql)
        .bind(user_id)
        .bind(request.order_item_id)
        .bind(kind.as_str())
        .bind(item_id)
        .bind(request.rating)
        .bind(comment)
        .fetch_one(pool)
        .await;

    match inserted {
        Ok(review) => Ok(ReviewOutcome::Created(review)),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(ReviewOutcome::AlreadyReviewed),
        Err(e) => Err(e),
    }
}

/// Reviews of one catalog item, newest first
pub async fn list_reviews(pool: &PgPool, kind: CatalogKind, item_id: Uuid) -> Result<Vec<Review>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT r.id, u.first_name || ' ' || u.last_name AS reviewer_name, r.rating, r.comment, r.created_at
        FROM reviews r
        JOIN users u ON u.id = r.user_id
        WHERE r.{} = $1
        ORDER BY r.created_at DESC, r.id DESC
        "#,
        kind.reference_column()
    );

    sqlx::query_as::<_, Review>(&sql).bind(item_id).fetch_all(pool).await
}
