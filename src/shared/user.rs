//! User roles and public profile
//!
//! Every account has exactly one role. Clients buy, suppliers own catalog
//! items and fulfil orders, admins manage the whole platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;
use crate::shared::validation::{is_valid_name, is_valid_phone};

/// Role attached to an account and carried inside its session token
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Supplier,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Client
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Supplier => "supplier",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client" => Some(Role::Client),
            "supplier" => Some(Role::Supplier),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User information safe to return to clients (no password hash)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Query string of the admin user listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserListQuery {
    #[serde(default)]
    pub role: Option<Role>,
    /// Matched against names, email and phone
    #[serde(default)]
    pub search: Option<String>,
}

/// Admin edit of an account; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
        {
            return Err(SharedError::validation("user", "no fields to update"));
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if let Some(name) = value {
                if !is_valid_name(name) {
                    return Err(SharedError::validation(
                        field,
                        "must be 1-50 characters of letters and spaces",
                    ));
                }
            }
        }
        if let Some(phone) = &self.phone {
            if !is_valid_phone(phone) {
                return Err(SharedError::validation("phone", "must be exactly 10 digits"));
            }
        }
        Ok(())
    }
}
