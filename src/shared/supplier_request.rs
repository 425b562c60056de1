//! Supplier onboarding
//!
//! Prospective suppliers submit a request without an account. An admin
//! approves it, which creates the supplier account, or rejects it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::user::UserProfile;
use crate::shared::validation::{is_valid_email, is_valid_name, is_valid_phone};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SupplierRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl SupplierRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierRequestStatus::Pending => "pending",
            SupplierRequestStatus::Approved => "approved",
            SupplierRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(SupplierRequestStatus::Pending),
            "approved" => Some(SupplierRequestStatus::Approved),
            "rejected" => Some(SupplierRequestStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for SupplierRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `POST /api/supplier-requests`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierRequestInput {
    pub company_name: String,
    /// Tax identification number of the company
    pub nit: String,
    /// Becomes the supplier account's name on approval
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    /// What the company wants to sell
    pub product_types: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl SupplierRequestInput {
    pub fn validate(&self) -> Result<(), SharedError> {
        for (field, value) in [
            ("company_name", &self.company_name),
            ("nit", &self.nit),
            ("product_types", &self.product_types),
        ] {
            if value.trim().is_empty() {
                return Err(SharedError::validation(field, "must not be empty"));
            }
        }
        if !is_valid_name(self.contact_person.trim()) {
            return Err(SharedError::validation(
                "contact_person",
                "must be 1-50 characters of letters and spaces",
            ));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(SharedError::validation("email", "invalid email format"));
        }
        if !is_valid_phone(&self.phone) {
            return Err(SharedError::validation("phone", "must be exactly 10 digits"));
        }
        Ok(())
    }
}

/// A stored supplier request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierRequest {
    pub id: i64,
    pub company_name: String,
    pub nit: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub product_types: String,
    pub message: Option<String>,
    pub status: SupplierRequestStatus,
    pub created_at: DateTime<Utc>,
}

/// Admin listing filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierRequestFilters {
    #[serde(default)]
    pub status: Option<SupplierRequestStatus>,
}

/// An admin's verdict on a pending request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SupplierDecision {
    Approved,
    Rejected,
}

impl SupplierDecision {
    pub fn status(&self) -> SupplierRequestStatus {
        match self {
            SupplierDecision::Approved => SupplierRequestStatus::Approved,
            SupplierDecision::Rejected => SupplierRequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierDecisionRequest {
    pub status: SupplierDecision,
}

/// Outcome of a decision
///
/// On approval the new account and its one-time password are returned to
/// the admin, who hands them over to the supplier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierDecisionResponse {
    pub request_id: i64,
    pub status: SupplierRequestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
}

/// Field checked by the availability endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityField {
    Email,
    Phone,
    Nit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityCheck {
    pub field: AvailabilityField,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    pub is_taken: bool,
}

/// First word as first name, the rest as last name
///
/// A single-word contact uses that word for both.
pub fn split_contact_name(contact_person: &str) -> (String, String) {
    let mut words = contact_person.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let rest = words.collect::<Vec<_>>().join(" ");
    if rest.is_empty() {
        (first.clone(), first)
    } else {
        (first, rest)
    }
}
