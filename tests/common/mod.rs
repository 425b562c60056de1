//! Common test utilities and helpers
//!
//! - Database fixture (skips when `DATABASE_URL` is unset)
//! - User and catalog fixtures
//! - HTTP helpers driving the router in-process
//! - Custom assertion macros

#![allow(dead_code)]

#[macro_use]
pub mod assertions;
#[macro_use]
pub mod database;
pub mod fixtures;
pub mod http;

pub use database::*;
pub use fixtures::*;
pub use http::*;
