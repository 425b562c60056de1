//! Saved shipping addresses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::SharedError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressInput {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub street: String,
    pub region: String,
    pub city: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), SharedError> {
        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("region", &self.region),
            ("city", &self.city),
        ] {
            if value.trim().is_empty() {
                return Err(SharedError::validation(field, "must not be empty"));
            }
        }
        if let Some(email) = &self.email {
            if !email.is_empty() && !email.contains('@') {
                return Err(SharedError::validation("email", "Invalid email format"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "ssr", derive(sqlx::FromRow))]
pub struct Address {
    pub id: i64,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub street: String,
    pub region: String,
    pub city: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
