//! Supplier onboarding
//!
//! ```text
//! supplier_requests/
//! ├── db.rs       - request storage, availability checks, decisions
//! └── handlers.rs - public submission, admin review
//! ```
//!
//! # Onboarding Flow
//!
//! 1. **Submit**: a prospective supplier posts company and contact details;
//!    every admin is notified
//! 2. **Review**: an admin lists pending requests
//! 3. **Decide**: approval creates a supplier account for the contact person
//!    with a one-time password; rejection only records the verdict
//!
//! Decisions are final and written to the activity log.

pub mod db;

pub mod handlers;
