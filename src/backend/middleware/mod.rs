//! Middleware Module
//!
//! HTTP middleware applied in front of handlers. Currently:
//!
//! - **`auth`** - bearer token verification and role gating

pub mod auth;

pub use auth::{auth_middleware, AuthUser, AuthenticatedUser};
