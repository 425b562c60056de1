//! Orders
//!
//! - **`placement`** - transactional order placement and cancellation
//! - **`db`** - listings, lookups, status updates, deletion
//! - **`handlers`** - HTTP handlers for buyers, suppliers and admins
//! - **`error`** - domain errors

pub mod error;

pub mod placement;

pub mod db;

pub mod handlers;

pub use db::{DeletedOrder, OrderScope, StatusChange};
pub use error::OrderError;
pub use placement::{cancel_order, place_order, plan_notifications, PlacedOrder, StockChange};
