/**
 * User Model and Database Operations
 */

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::backend::orders::db::cancel_open_orders;
use crate::backend::orders::placement::finish;
use crate::backend::orders::OrderError;
use crate::shared::{Role, UserListQuery, UserProfile, UserUpdate};

const USER_COLUMNS: &str =
    "id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at";

/// User row as stored, including the password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Stored role; unknown values degrade to the least privileged role
    pub fn role(&self) -> Role {
        Role::from_str(&self.role).unwrap_or_else(|| {
            tracing::warn!("Unknown role '{}' for user {}", self.role, self.id);
            Role::Client
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            role: self.role(),
            created_at: self.created_at,
        }
    }
}

/// Fields required to create an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Insert an account; runs on a pool or inside a caller's transaction
pub async fn create_user<'e, E>(executor: E, new_user: NewUser) -> Result<User, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&new_user.first_name)
    .bind(&new_user.last_name)
    .bind(&new_user.phone)
    .bind(&new_user.email)
    .bind(&new_user.password_hash)
    .bind(new_user.role.as_str())
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_phone(pool: &PgPool, phone: &str) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at
        FROM users
        WHERE phone = $1
        "#,
    )
    .bind(phone)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, first_name, last_name, phone, email, password_hash, role, created_at, updated_at
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Users for the admin listing, newest first
///
/// `search` matches name, email or phone, case-insensitively.
pub async fn list_users(pool: &PgPool, query: &UserListQuery) -> Result<Vec<User>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {} FROM users WHERE TRUE", USER_COLUMNS));

    if let Some(role) = query.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder
            .push(" AND (LOWER(first_name || ' ' || last_name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR LOWER(email) LIKE ")
            .push_bind(pattern)
            .push(" OR phone LIKE ")
            .push_bind(format!("%{}%", search))
            .push(")");
    }
    builder.push(" ORDER BY created_at DESC");

    builder.build_query_as::<User>().fetch_all(pool).await
}

/// Apply an admin edit; absent fields keep their value
pub async fn update_user(pool: &PgPool, id: Uuid, update: &UserUpdate) -> Result<Option<User>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE users
        SET first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            phone = COALESCE($3, phone),
            role = COALESCE($4, role),
            updated_at = NOW()
        WHERE id = $5
        RETURNING {}
        "#,
        USER_COLUMNS
    );

    sqlx::query_as::<_, User>(&sql)
        .bind(update.first_name.as_deref().map(str::trim))
        .bind(update.last_name.as_deref().map(str::trim))
        .bind(update.phone.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update_password(pool: &PgPool, id: Uuid, password_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove an account and everything it owns
///
/// Open orders are cancelled first so the stock they hold goes back to the
/// catalog before the cascade removes them. Returns the removed user.
pub async fn delete_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, OrderError> {
    let mut tx = pool.begin().await?;
    let result = async {
        let released = cancel_open_orders(&mut tx, id).await?;
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {}", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        Ok::<_, OrderError>((user, released))
    }
    .await;
    let (user, released) = finish(tx, result, "user deletion").await?;

    if let Some(user) = &user {
        tracing::info!("User {} deleted; {} open orders released", user.email, released.len());
    }
    Ok(user)
}
