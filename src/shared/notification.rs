//! In-app notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A notification shown to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Notification {
    pub id: i64,
    pub message: String,
    /// Frontend route the notification points at
    pub link_url: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
