//! Authentication Module
//!
//! Accounts, sessions and the auth endpoints.
//!
//! ```text
//! auth/
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT token management
//! └── handlers/       - register, login, me, password change, admin users
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Register**: profile + password → user created → token returned
//! 2. **Login**: email + password → credentials verified → token returned
//! 3. **Me**: token → verified by the middleware → profile returned
//! 4. **Change password**: token + current password → new hash stored
//!
//! Tokens carry `{sub, email, role, exp, iat}` and expire after the
//! configured number of days.

pub mod users;

pub mod sessions;

pub mod handlers;

pub use handlers::{change_password, get_me, login, register};
pub use sessions::{create_token, verify_token, Claims};
pub use users::{
    create_user, delete_user, get_user_by_email, get_user_by_id, get_user_by_phone, list_users,
    update_password, update_user, NewUser, User,
};
