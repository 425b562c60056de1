//! Reviews
//!
//! Buyers rate the lines of their delivered orders, once per line. Reviews
//! are public on the item they point at.

pub mod db;

pub mod handlers;
