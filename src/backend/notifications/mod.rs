//! In-app notifications
//!
//! Written by the order flows (new order, low stock, delivered) and read by
//! their recipients.

pub mod db;

pub mod handlers;

pub use db::{create_notification, notify_admins};
