//! brewmarket - Coffee Marketplace Backend
//!
//! A REST API where clients buy coffee products and supplies, suppliers
//! manage their catalog and fulfil orders, and admins oversee everything.
//!
//! # Module Structure
//!
//! - **`shared`** - request, response and domain types with their validation
//! - **`backend`** - Axum server, PostgreSQL persistence, order flows
//!   (only compiled with the `ssr` feature)
//!
//! # Order Placement
//!
//! Checkout runs in one transaction that locks every purchased item with
//! `SELECT ... FOR UPDATE`, checks stock, writes the order and its lines,
//! and decrements stock. Concurrent buyers of the same item are serialized
//! by the database, so stock never goes negative.
//!
//! ```rust,no_run
//! use brewmarket::backend::server::{create_app, AppConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = create_app(AppConfig::from_env()?).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
