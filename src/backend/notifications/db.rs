/**
 * Notification Queries
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::shared::notification::Notification;

/// Number of notifications returned by a listing
pub const LIST_LIMIT: i64 = 20;

/// Store a notification for `user_id` and return its id
pub async fn create_notification(
    pool: &PgPool,
    user_id: Uuid,
    message: &str,
    link_url: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO notifications (user_id, message, link_url) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(message)
    .bind(link_url)
    .fetch_one(pool)
    .await
}

/// Store the same notification for every admin; returns how many were stored
pub async fn notify_admins(pool: &PgPool, message: &str, link_url: Option<&str>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, message, link_url)
        SELECT id, $1, $2 FROM users WHERE role = 'admin'
        "#,
    )
    .bind(message)
    .bind(link_url)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Latest notifications, newest first
pub async fn list_notifications(pool: &PgPool, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, message, link_url, is_read, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(LIST_LIMIT)
    .fetch_all(pool)
    .await
}

/// Mark every unread notification as read; returns how many changed
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_notification(pool: &PgPool, id: i64, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
