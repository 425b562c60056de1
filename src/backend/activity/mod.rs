//! Admin activity log
//!
//! Admin handlers record what they changed after the change is committed.
//! A failed write is logged and never fails the action itself.

pub mod db;

pub mod handlers;

pub use db::log_admin_activity;
