//! Server setup: configuration, shared state and application assembly.

pub mod state;

pub mod config;

pub mod init;

pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use init::create_app;
pub use state::AppState;
