//! User, catalog and order fixtures

use brewmarket::backend::auth::sessions::create_token;
use brewmarket::backend::auth::users::{create_user, NewUser};
use brewmarket::backend::catalog::db::create_item;
use brewmarket::backend::server::AppConfig;
use brewmarket::shared::{
    CartLine, CatalogItem, CatalogItemInput, CatalogKind, PlaceOrderRequest, Role, ShippingAddress,
};
use sqlx::PgPool;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "brewmarket-test-secret";
pub const TEST_PASSWORD: &str = "Espresso#42";

pub fn test_config() -> AppConfig {
    AppConfig::builder()
        .jwt_secret(TEST_JWT_SECRET)
        .build()
        .expect("valid test config")
}

/// Ten digits derived from a fresh UUID
pub fn unique_phone() -> String {
    format!("{:010}", Uuid::new_v4().as_u128() % 10_000_000_000)
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}_{}@brewmarket.test", prefix, Uuid::new_v4().simple())
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub token: String,
}

/// Create a user with the given role and a valid token for it
pub async fn create_test_user(pool: &PgPool, role: Role) -> TestUser {
    // Low cost keeps the suite fast
    let password_hash = bcrypt::hash(TEST_PASSWORD, 4).expect("hash");

    let user = create_user(
        pool,
        NewUser {
            first_name: "Test".to_string(),
            last_name: role.as_str().to_string(),
            phone: unique_phone(),
            email: unique_email(role.as_str()),
            password_hash,
            role,
        },
    )
    .await
    .expect("Failed to create test user");

    let token = create_token(&test_config(), user.id, &user.email, role).expect("token");

    TestUser {
        id: user.id,
        email: user.email,
        role,
        token,
    }
}

pub fn item_input(name: &str, price_cents: i64, stock: i32) -> CatalogItemInput {
    CatalogItemInput {
        name: name.to_string(),
        category: "Whole bean".to_string(),
        brand: "Finca Test".to_string(),
        description: "Fixture item".to_string(),
        price_cents,
        stock,
    }
}

pub async fn create_catalog_item(
    pool: &PgPool,
    kind: CatalogKind,
    supplier_id: Uuid,
    price_cents: i64,
    stock: i32,
) -> CatalogItem {
    let name = format!("Item {}", Uuid::new_v4().simple());
    create_item(pool, kind, supplier_id, &item_input(&name, price_cents, stock))
        .await
        .expect("Failed to create catalog item")
}

pub async fn stock_of(pool: &PgPool, kind: CatalogKind, id: Uuid) -> i32 {
    let sql = format!("SELECT stock FROM {} WHERE id = $1", kind.table());
    sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("stock lookup")
}

pub async fn order_count(pool: &PgPool, user_id: Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .expect("order count")
}

pub async fn order_status(pool: &PgPool, order_id: i64) -> String {
    sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await
        .expect("order status")
}

pub fn line(item: &CatalogItem, quantity: i32) -> CartLine {
    CartLine {
        item_id: item.id,
        kind: item.kind,
        quantity,
        unit_price_cents: item.price_cents,
    }
}

pub fn shipping_address() -> ShippingAddress {
    ShippingAddress {
        first_name: "Lucía".to_string(),
        last_name: "Gómez".to_string(),
        phone: "3001234567".to_string(),
        street: "Calle 10 # 4-21".to_string(),
        region: "Antioquia".to_string(),
        city: "Medellín".to_string(),
        ..Default::default()
    }
}

pub fn order_request(lines: Vec<CartLine>) -> PlaceOrderRequest {
    let total_cents = lines
        .iter()
        .map(|l| l.unit_price_cents * i64::from(l.quantity))
        .sum();

    PlaceOrderRequest {
        lines,
        shipping_address: shipping_address(),
        payment_method: "card".to_string(),
        total_cents,
    }
}
