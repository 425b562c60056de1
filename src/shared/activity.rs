//! Admin activity log
//!
//! Every admin action that changes someone else's data leaves an entry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    OrderStatusUpdated,
    OrderDeleted,
    SupplierRequestUpdated,
    UserUpdated,
    UserDeleted,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::OrderStatusUpdated => "ORDER_STATUS_UPDATED",
            AdminAction::OrderDeleted => "ORDER_DELETED",
            AdminAction::SupplierRequestUpdated => "SUPPLIER_REQUEST_UPDATED",
            AdminAction::UserUpdated => "USER_UPDATED",
            AdminAction::UserDeleted => "USER_DELETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ORDER_STATUS_UPDATED" => Some(AdminAction::OrderStatusUpdated),
            "ORDER_DELETED" => Some(AdminAction::OrderDeleted),
            "SUPPLIER_REQUEST_UPDATED" => Some(AdminAction::SupplierRequestUpdated),
            "USER_UPDATED" => Some(AdminAction::UserUpdated),
            "USER_DELETED" => Some(AdminAction::UserDeleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged admin action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub id: i64,
    /// `None` once the admin account was deleted
    pub admin_id: Option<Uuid>,
    /// Name at the time of the action
    pub admin_name: String,
    pub action: AdminAction,
    pub target_type: Option<String>,
    pub target_id: Option<String>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Query string of the activity listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityFilters {
    /// Substring of the admin's name
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub action: Option<AdminAction>,
    /// Calendar day (UTC)
    #[serde(default)]
    pub date: Option<NaiveDate>,
}
