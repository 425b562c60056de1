//! Onboarding, admin management, reviews and the activity log over HTTP
//!
//! Skipped when `DATABASE_URL` is unset.

#![cfg(feature = "ssr")]

#[macro_use]
#[path = "../common/mod.rs"]
mod common;

use axum::http::{Method, StatusCode};
use brewmarket::backend::cart::db::add_item;
use brewmarket::backend::orders::db::update_order_status;
use brewmarket::backend::orders::place_order;
use brewmarket::shared::cart::CartItemRequest;
use brewmarket::shared::{CatalogKind, OrderStatus, OrderStatusUpdate, Role};
use common::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

const THRESHOLD: i32 = 10;

fn supplier_request_body(email: &str, phone: &str, nit: &str) -> Value {
    json!({
        "company_name": "Tostadora Andina",
        "nit": nit,
        "contact_person": "Camila Ortiz",
        "email": email,
        "phone": phone,
        "city": "Pereira",
        "product_types": "Roasted coffee",
        "message": "We roast weekly"
    })
}

fn unique_nit() -> String {
    format!("900{}", Uuid::new_v4().as_u128() % 1_000_000_000)
}

async fn mark_delivered(pool: &PgPool, order_id: i64) {
    let update = OrderStatusUpdate {
        status: OrderStatus::Delivered,
        shipping_company: None,
        tracking_number: None,
    };
    update_order_status(pool, order_id, &update).await.expect("delivered");
}

/// Activity entries of `action` pointing at `target_id`
async fn activity_for(app: &axum::Router, admin_token: &str, action: &str, target_id: &str) -> Vec<Value> {
    let entries = assert_status!(
        send(
            app,
            Method::GET,
            &format!("/api/admin/activity?action={}", action),
            Some(admin_token),
            None,
        )
        .await,
        StatusCode::OK
    );
    entries
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .filter(|e| e["target_id"] == target_id)
        .collect()
}

#[tokio::test]
async fn test_concurrent_cart_adds_keep_one_line() {
    let db = require_db!();
    let pool = db.pool().clone();
    let supplier = create_test_user(&pool, Role::Supplier).await;
    let buyer = create_test_user(&pool, Role::Client).await;
    let item = create_catalog_item(&pool, CatalogKind::Product, supplier.id, 1000, 50).await;

    let buyer_id = buyer.id;
    let mut handles = Vec::new();
    for _ in 0..16 {
        let pool = pool.clone();
        let request = CartItemRequest {
            item_id: item.id,
            kind: CatalogKind::Product,
            quantity: 1,
        };
        handles.push(tokio::spawn(async move { add_item(&pool, buyer_id, &request).await }));
    }
    for handle in handles {
        handle.await.expect("task").expect("added");
    }

    let rows: Vec<i32> = sqlx::query_scalar("SELECT quantity FROM cart_items WHERE user_id = $1")
        .bind(buyer_id)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows, vec![16]);
}

#[tokio::test]
async fn test_supplier_onboarding_creates_working_account() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let admin = create_test_user(pool, Role::Admin).await;
    let client = create_test_user(pool, Role::Client).await;

    let email = unique_email("roaster");
    let phone = unique_phone();
    let nit = unique_nit();

    let created = assert_status!(
        send(
            &app,
            Method::POST,
            "/api/supplier-requests",
            None,
            Some(supplier_request_body(&email, &phone, &nit)),
        )
        .await,
        StatusCode::CREATED
    );
    assert_eq!(created["status"], "pending");
    let request_id = created["id"].as_i64().unwrap();

    // Same NIT again
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/supplier-requests",
        None,
        Some(supplier_request_body(&unique_email("roaster"), &unique_phone(), &nit)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let availability = assert_status!(
        send(
            &app,
            Method::POST,
            "/api/supplier-requests/validate",
            None,
            Some(json!({ "field": "email", "value": email.to_uppercase() })),
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(availability["is_taken"], true);

    let inbox = assert_status!(
        send(&app, Method::GET, "/api/notifications", Some(&admin.token), None).await,
        StatusCode::OK
    );
    assert!(inbox
        .as_array()
        .unwrap()
        .iter()
        .any(|n| n["link_url"] == "/admin/supplier-requests"));

    let pending = assert_status!(
        send(&app, Method::GET, "/api/admin/supplier-requests?status=pending", Some(&admin.token), None).await,
        StatusCode::OK
    );
    assert!(pending.as_array().unwrap().iter().any(|r| r["id"] == request_id));

    let decide = format!("/api/admin/supplier-requests/{}/status", request_id);
    let (status, _) = send(&app, Method::PUT, &decide, Some(&client.token), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let decision = assert_status!(
        send(&app, Method::PUT, &decide, Some(&admin.token), Some(json!({ "status": "approved" }))).await,
        StatusCode::OK
    );
    assert_eq!(decision["status"], "approved");
    assert_eq!(decision["supplier"]["role"], "supplier");
    assert_eq!(decision["supplier"]["first_name"], "Camila");
    let password = decision["temporary_password"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::PUT, &decide, Some(&admin.token), Some(json!({ "status": "rejected" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The new supplier signs in and sells
    let session = assert_status!(
        send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(session["user"]["role"], "supplier");
    let token = session["token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/supplier/catalog/products",
        Some(token),
        Some(json!({
            "name": "Pereira Natural",
            "category": "Whole bean",
            "brand": "Tostadora Andina",
            "description": "Natural process",
            "price_cents": 4200,
            "stock": 25
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let logged = activity_for(&app, &admin.token, "SUPPLIER_REQUEST_UPDATED", &request_id.to_string()).await;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["details"]["status"], "approved");
}

#[tokio::test]
async fn test_approval_is_refused_when_contact_already_registered() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let admin = create_test_user(pool, Role::Admin).await;

    let email = unique_email("roaster");
    let phone = unique_phone();
    let created = assert_status!(
        send(
            &app,
            Method::POST,
            "/api/supplier-requests",
            None,
            Some(supplier_request_body(&email, &phone, &unique_nit())),
        )
        .await,
        StatusCode::CREATED
    );
    let request_id = created["id"].as_i64().unwrap();

    // The contact signs up as a buyer before the decision
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "first_name": "Camila",
            "last_name": "Ortiz",
            "phone": unique_phone(),
            "email": email,
            "password": TEST_PASSWORD
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/supplier-requests/{}/status", request_id),
        Some(&admin.token),
        Some(json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let rejected = assert_status!(
        send(&app, Method::GET, "/api/admin/supplier-requests?status=rejected", Some(&admin.token), None).await,
        StatusCode::OK
    );
    assert!(rejected.as_array().unwrap().iter().any(|r| r["id"] == request_id));
}

#[tokio::test]
async fn test_admin_promotes_and_removes_users() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let admin = create_test_user(pool, Role::Admin).await;
    let member = create_test_user(pool, Role::Client).await;

    let (status, _) = send(&app, Method::GET, "/api/orders/supplier/mine", Some(&member.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let found = assert_status!(
        send(
            &app,
            Method::GET,
            &format!("/api/admin/users?search={}", member.email),
            Some(&admin.token),
            None,
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(found.as_array().unwrap().len(), 1);

    let promoted = assert_status!(
        send(
            &app,
            Method::PUT,
            &format!("/api/admin/users/{}", member.id),
            Some(&admin.token),
            Some(json!({ "role": "supplier" })),
        )
        .await,
        StatusCode::OK
    );
    assert_eq!(promoted["role"], "supplier");

    // The stored role applies to the existing token
    let (status, _) = send(&app, Method::GET, "/api/orders/supplier/mine", Some(&member.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/users/{}", admin.id),
        Some(&admin.token),
        Some(json!({ "role": "client" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let logged = activity_for(&app, &admin.token, "USER_UPDATED", &member.id.to_string()).await;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["details"]["to_role"], "supplier");

    // Removing an account releases the stock of its open orders
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, member.id, 1000, 9).await;
    let other = create_test_user(pool, Role::Supplier).await;
    let kept = create_catalog_item(pool, CatalogKind::Supply, other.id, 500, 6).await;
    place_order(pool, buyer.id, &order_request(vec![line(&kept, 4), line(&item, 2)]), THRESHOLD)
        .await
        .unwrap();
    assert_eq!(stock_of(pool, CatalogKind::Supply, kept.id).await, 2);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/users/{}", buyer.id),
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(stock_of(pool, CatalogKind::Supply, kept.id).await, 6);
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 9);
    assert_eq!(order_count(pool, buyer.id).await, 0);

    let (status, _) = send(&app, Method::GET, "/api/auth/me", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/users/{}", admin.id),
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_reviews_require_delivery_and_mark_the_line() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let stranger = create_test_user(pool, Role::Client).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, supplier.id, 2500, 20).await;
    let dripper = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 4500, 20).await;

    let placed = place_order(
        pool,
        buyer.id,
        &order_request(vec![line(&beans, 1), line(&dripper, 1)]),
        THRESHOLD,
    )
    .await
    .unwrap();
    let line_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(placed.order_id)
        .fetch_all(pool)
        .await
        .unwrap();
    let review = json!({ "order_item_id": line_ids[0], "rating": 5, "comment": "Bright and sweet" });

    let (status, _) = send(&app, Method::POST, "/api/reviews", Some(&buyer.token), Some(review.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    mark_delivered(pool, placed.order_id).await;

    let (status, _) = send(&app, Method::POST, "/api/reviews", Some(&stranger.token), Some(review.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let created = assert_status!(
        send(&app, Method::POST, "/api/reviews", Some(&buyer.token), Some(review.clone())).await,
        StatusCode::CREATED
    );
    assert_eq!(created["reviewer_name"], "Test client");
    assert_eq!(created["rating"], 5);

    let (status, _) = send(&app, Method::POST, "/api/reviews", Some(&buyer.token), Some(review)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/reviews",
        Some(&buyer.token),
        Some(json!({ "order_item_id": line_ids[1], "rating": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let public = assert_status!(
        send(&app, Method::GET, &format!("/api/reviews/products/{}", beans.id), None, None).await,
        StatusCode::OK
    );
    assert_eq!(public.as_array().unwrap().len(), 1);
    assert_eq!(public[0]["comment"], "Bright and sweet");

    let detail = assert_status!(
        send(&app, Method::GET, &format!("/api/orders/{}", placed.order_id), Some(&buyer.token), None).await,
        StatusCode::OK
    );
    let reviewed: Vec<(i64, bool)> = detail["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| (i["id"].as_i64().unwrap(), i["is_reviewed"].as_bool().unwrap()))
        .collect();
    assert_eq!(reviewed, vec![(line_ids[0], true), (line_ids[1], false)]);
}

#[tokio::test]
async fn test_password_change() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let user = create_test_user(pool, Role::Client).await;
    let new_password = "Cortado#2026";

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&user.token),
        Some(json!({
            "current_password": "Wrong#1234",
            "new_password": new_password,
            "confirm_password": new_password
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/change-password",
        Some(&user.token),
        Some(json!({
            "current_password": TEST_PASSWORD,
            "new_password": new_password,
            "confirm_password": new_password
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let login = |password: &str| json!({ "email": user.email, "password": password });
    let (status, _) = send(&app, Method::POST, "/api/auth/login", None, Some(login(TEST_PASSWORD))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::POST, "/api/auth/login", None, Some(login(new_password))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_supplier_detail_and_admin_status_log() {
    let db = require_db!();
    let pool = db.pool();
    let app = test_app(test_config(), Some(pool.clone()));
    let roaster = create_test_user(pool, Role::Supplier).await;
    let outfitter = create_test_user(pool, Role::Supplier).await;
    let bystander = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let admin = create_test_user(pool, Role::Admin).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, roaster.id, 2500, 10).await;
    let kettle = create_catalog_item(pool, CatalogKind::Supply, outfitter.id, 9000, 10).await;

    let placed = place_order(
        pool,
        buyer.id,
        &order_request(vec![line(&beans, 2), line(&kettle, 1)]),
        THRESHOLD,
    )
    .await
    .unwrap();
    let detail_uri = format!("/api/orders/supplier/{}", placed.order_id);

    let detail = assert_status!(
        send(&app, Method::GET, &detail_uri, Some(&roaster.token), None).await,
        StatusCode::OK
    );
    let items = detail["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["item_id"], beans.id.to_string());
    assert_eq!(detail["customer_name"], "Test client");

    let (status, _) = send(&app, Method::GET, &detail_uri, Some(&bystander.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &detail_uri, Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin cancel goes through the stock restore and is logged
    let admin_uri = format!("/api/orders/admin/{}", placed.order_id);
    let (status, _) = send(&app, Method::PUT, &admin_uri, Some(&admin.token), Some(json!({ "status": "cancelled" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 10);
    assert_eq!(stock_of(pool, CatalogKind::Supply, kettle.id).await, 10);

    let (status, _) = send(&app, Method::PUT, &admin_uri, Some(&admin.token), Some(json!({ "status": "pending" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&app, Method::PUT, &detail_uri, Some(&roaster.token), Some(json!({ "status": "processing" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 10);

    let logged = activity_for(&app, &admin.token, "ORDER_STATUS_UPDATED", &placed.order_id.to_string()).await;
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0]["details"]["from_status"], "pending");
    assert_eq!(logged[0]["details"]["to_status"], "cancelled");
    assert_eq!(logged[0]["details"]["customer_name"], "Test client");
    assert_eq!(logged[0]["admin_name"], "Test admin");

    let (status, _) = send(&app, Method::GET, "/api/admin/activity", Some(&buyer.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
