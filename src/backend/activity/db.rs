/**
 * Activity Log Queries
 */

use chrono::{DateTime, Days, NaiveTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::shared::{ActivityEntry, ActivityFilters, AdminAction};

/// Number of entries returned by a listing
pub const LIST_LIMIT: i64 = 200;

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: i64,
    admin_id: Option<Uuid>,
    admin_name: String,
    action: String,
    target_type: Option<String>,
    target_id: Option<String>,
    details: Value,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_entry(self) -> Result<ActivityEntry, sqlx::Error> {
        let action = AdminAction::from_str(&self.action)
            .ok_or_else(|| sqlx::Error::Decode(format!("unknown admin action '{}'", self.action).into()))?;

        Ok(ActivityEntry {
            id: self.id,
            admin_id: self.admin_id,
            admin_name: self.admin_name,
            action,
            target_type: self.target_type,
            target_id: self.target_id,
            details: self.details,
            created_at: self.created_at,
        })
    }
}

/// Record an admin action
///
/// The admin's current name is stored with the entry so it survives the
/// account. Errors are logged, not returned.
pub async fn log_admin_activity(
    pool: &PgPool,
    admin_id: Uuid,
    action: AdminAction,
    target_type: &str,
    target_id: &str,
    details: Value,
) {
    let result = sqlx::query(
        r#"
        INSERT INTO admin_activity_log (admin_id, admin_name, action, target_type, target_id, details)
        SELECT u.id, u.first_name || ' ' || u.last_name, $2, $3, $4, $5
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(admin_id)
    .bind(action.as_str())
    .bind(target_type)
    .bind(target_id)
    .bind(&details)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            tracing::warn!("Activity {} by unknown admin {} not logged", action, admin_id)
        }
        Ok(_) => tracing::debug!("Logged {} on {} {} by {}", action, target_type, target_id, admin_id),
        Err(e) => tracing::warn!("Failed to log activity {} by {}: {:?}", action, admin_id, e),
    }
}

/// Newest entries first, at most `LIST_LIMIT`
pub async fn list_activity(pool: &PgPool, filters: &ActivityFilters) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
        r#"
        SELECT id, admin_id, admin_name, action, target_type, target_id, details, created_at
        FROM admin_activity_log
        WHERE TRUE
        "#,
    );

    if let Some(name) = filters.admin_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        query
            .push(" AND LOWER(admin_name) LIKE ")
            .push_bind(format!("%{}%", name.to_lowercase()));
    }
    if let Some(action) = filters.action {
        query.push(" AND action = ").push_bind(action.as_str());
    }
    if let Some(date) = filters.date {
        let start = date.and_time(NaiveTime::MIN).and_utc();
        let end = date
            .checked_add_days(Days::new(1))
            .map(|next| next.and_time(NaiveTime::MIN).and_utc());
        query.push(" AND created_at >= ").push_bind(start);
        if let Some(end) = end {
            query.push(" AND created_at < ").push_bind(end);
        }
    }
    query.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(LIST_LIMIT);

    let rows: Vec<ActivityRow> = query.build_query_as().fetch_all(pool).await?;
    rows.into_iter().map(ActivityRow::into_entry).collect()
}
