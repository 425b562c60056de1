/**
 * Authentication Handler Types
 *
 * Request and response bodies for register, login, me and password
 * changes, plus their rules.
 */

use serde::{Deserialize, Serialize};

use crate::shared::validation::{is_strong_password, is_valid_email, is_valid_name, is_valid_phone};
use crate::shared::{SharedError, UserProfile};

pub use crate::shared::validation::normalize_email;

/// Registration request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    /// Exactly 10 digits
    pub phone: String,
    pub email: String,
    /// At least 8 characters with a lowercase letter, an uppercase letter,
    /// a digit and a special character
    pub password: String,
}

/// Login request
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change for the signed-in user
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    /// Same strength rule as registration
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.current_password.is_empty() {
            return Err(SharedError::validation("current_password", "is required"));
        }
        if !is_strong_password(&self.new_password) {
            return Err(SharedError::validation(
                "new_password",
                "must be at least 8 characters with upper and lower case letters, a digit and a special character",
            ));
        }
        if self.confirm_password != self.new_password {
            return Err(SharedError::validation("confirm_password", "passwords do not match"));
        }
        Ok(())
    }
}

/// Returned by register and login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if !is_valid_name(&self.first_name) {
            return Err(SharedError::validation(
                "first_name",
                "must be 1-50 characters of letters and spaces",
            ));
        }
        if !is_valid_name(&self.last_name) {
            return Err(SharedError::validation(
                "last_name",
                "must be 1-50 characters of letters and spaces",
            ));
        }
        if !is_valid_phone(&self.phone) {
            return Err(SharedError::validation("phone", "must be exactly 10 digits"));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(SharedError::validation("email", "invalid email format"));
        }
        if !is_strong_password(&self.password) {
            return Err(SharedError::validation(
                "password",
                "must be at least 8 characters with upper and lower case letters, a digit and a special character",
            ));
        }
        Ok(())
    }
}
