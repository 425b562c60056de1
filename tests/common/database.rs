//! Database test fixture
//!
//! Tests share one PostgreSQL database and run concurrently, so they never
//! truncate tables: every test works on users and items it created itself.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub struct TestDatabase {
    pool: PgPool,
}

impl TestDatabase {
    /// Connect to `DATABASE_URL` and run migrations; `None` when unset
    pub async fn connect() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(&database_url)
            .await
            .expect("Failed to create test database pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Connect to the test database or return early from the test
macro_rules! require_db {
    () => {
        match $crate::common::TestDatabase::connect().await {
            Some(db) => db,
            None => {
                eprintln!("DATABASE_URL not set; skipping database test");
                return;
            }
        }
    };
}
