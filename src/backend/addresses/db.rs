/**
 * Address Queries
 *
 * Updates and deletes carry the owner in their `WHERE` clause, so touching
 * someone else's address looks exactly like touching a missing one.
 */

use sqlx::PgPool;
use uuid::Uuid;

use crate::shared::address::{Address, AddressInput};

const ADDRESS_COLUMNS: &str =
    "id, user_id, first_name, last_name, phone, email, street, region, city, note, created_at";

fn blank_to_none(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn list_addresses(pool: &PgPool, user_id: Uuid) -> Result<Vec<Address>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM user_addresses WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        ADDRESS_COLUMNS
    );
    sqlx::query_as::<_, Address>(&sql).bind(user_id).fetch_all(pool).await
}

pub async fn create_address(
    pool: &PgPool,
    user_id: Uuid,
    input: &AddressInput,
) -> Result<Address, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO user_addresses (user_id, first_name, last_name, phone, email, street, region, city, note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        ADDRESS_COLUMNS
    );

    sqlx::query_as::<_, Address>(&sql)
        .bind(user_id)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.phone.trim())
        .bind(blank_to_none(&input.email))
        .bind(input.street.trim())
        .bind(input.region.trim())
        .bind(input.city.trim())
        .bind(blank_to_none(&input.note))
        .fetch_one(pool)
        .await
}

pub async fn update_address(
    pool: &PgPool,
    id: i64,
    user_id: Uuid,
    input: &AddressInput,
) -> Result<Option<Address>, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE user_addresses
        SET first_name = $1, last_name = $2, phone = $3, email = $4,
            street = $5, region = $6, city = $7, note = $8
        WHERE id = $9 AND user_id = $10
        RETURNING {}
        "#,
        ADDRESS_COLUMNS
    );

    sqlx::query_as::<_, Address>(&sql)
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.phone.trim())
        .bind(blank_to_none(&input.email))
        .bind(input.street.trim())
        .bind(input.region.trim())
        .bind(input.city.trim())
        .bind(blank_to_none(&input.note))
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_address(pool: &PgPool, id: i64, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
