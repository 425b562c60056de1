//! Backend Module
//!
//! Server-side code for the brewmarket API: an Axum HTTP server over a
//! PostgreSQL database. Only compiled with the `ssr` feature.
//!
//! # Architecture
//!
//! - **`server`** - configuration, application state, app assembly
//! - **`routes`** - router and route tables
//! - **`middleware`** - bearer token authentication
//! - **`error`** - `BackendError` and its HTTP mapping
//! - **`auth`** - accounts, sessions, register/login/me
//! - **`catalog`** - products and supplies
//! - **`cart`** - shopping carts
//! - **`addresses`** - saved shipping addresses
//! - **`orders`** - order placement, cancellation, listings, status updates
//! - **`notifications`** - in-app notifications
//! - **`supplier_requests`** - supplier onboarding and admin decisions
//! - **`reviews`** - reviews of delivered order lines
//! - **`activity`** - admin activity log
//!
//! # Concurrency
//!
//! Handlers share nothing but the connection pool and the immutable
//! configuration. Contention on stock is resolved by row locks inside the
//! order transactions, not by in-process locks.

pub mod server;

pub mod routes;

pub mod middleware;

pub mod error;

pub mod auth;

pub mod catalog;

pub mod cart;

pub mod addresses;

pub mod orders;

pub mod notifications;

pub mod supplier_requests;

pub mod reviews;

pub mod activity;

pub use error::BackendError;
pub use server::create_app;
