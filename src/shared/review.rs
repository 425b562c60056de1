//! Product reviews
//!
//! A buyer may review each line of a delivered order once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

pub const MAX_COMMENT_CHARS: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewRequest {
    /// The order line being reviewed; it determines the catalog item
    pub order_item_id: i64,
    /// 1 to 5
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if !(1..=5).contains(&self.rating) {
            return Err(SharedError::validation("rating", "must be between 1 and 5"));
        }
        if let Some(comment) = &self.comment {
            if comment.trim().chars().count() > MAX_COMMENT_CHARS {
                return Err(SharedError::validation(
                    "comment",
                    format!("must be at most {} characters", MAX_COMMENT_CHARS),
                ));
            }
        }
        Ok(())
    }
}

/// A review as shown on an item page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Review {
    pub id: i64,
    pub reviewer_name: String,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
