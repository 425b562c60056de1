//! Authentication Handlers
//!
//! - **`register`** - POST /api/auth/register
//! - **`login`** - POST /api/auth/login
//! - **`get_me`** - GET /api/auth/me
//! - **`change_password`** - POST /api/auth/change-password
//! - **`admin`** - admin user management under /api/admin/users
//!
//! Passwords are hashed with bcrypt; sessions are stateless JWTs carrying the
//! user's role.

pub mod types;

pub mod register;

pub mod login;

pub mod me;

pub mod password;

pub mod admin;

pub use types::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest};

pub use login::login;
pub use me::get_me;
pub use password::change_password;
pub use register::register;
