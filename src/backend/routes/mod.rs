//! Route Configuration
//!
//! ```text
//! routes/
//! ├── router.rs       - Router assembly, CORS, tracing, fallback
//! └── api_routes.rs   - Public and authenticated API routes
//! ```

/// Main router creation
pub mod router;

/// API endpoint routes
pub mod api_routes;

pub use router::create_router;
