//! Order placement and cancellation against a real database
//!
//! Skipped when `DATABASE_URL` is unset.

#![cfg(feature = "ssr")]

#[macro_use]
#[path = "../common/mod.rs"]
mod common;

use assert_matches::assert_matches;
use brewmarket::backend::notifications::db::list_notifications;
use brewmarket::backend::orders::db::{delete_order, update_order_status};
use brewmarket::backend::orders::{cancel_order, place_order, OrderError};
use brewmarket::shared::{CatalogKind, OrderStatus, OrderStatusUpdate, Role};
use common::*;
use pretty_assertions::assert_eq;

const THRESHOLD: i32 = 10;

fn move_to(status: OrderStatus) -> OrderStatusUpdate {
    OrderStatusUpdate {
        status,
        shipping_company: None,
        tracking_number: None,
    }
}

#[tokio::test]
async fn test_order_stores_snapshot_price_and_decrements_stock() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1500, 20).await;

    let mut cart_line = line(&item, 2);
    cart_line.unit_price_cents = 1200;

    let placed = place_order(pool, buyer.id, &order_request(vec![cart_line]), THRESHOLD)
        .await
        .expect("order placed");

    let prices: Vec<i64> =
        sqlx::query_scalar("SELECT price_at_purchase_cents FROM order_items WHERE order_id = $1")
            .bind(placed.order_id)
            .fetch_all(pool)
            .await
            .unwrap();
    assert_eq!(prices, vec![1200]);
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 18);
    assert_eq!(order_status(pool, placed.order_id).await, "pending");
}

#[tokio::test]
async fn test_order_with_n_lines_writes_one_header_and_n_items() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, supplier.id, 2500, 30).await;
    let ground = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1900, 30).await;
    let filters = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 700, 30).await;

    let request = order_request(vec![line(&beans, 1), line(&ground, 2), line(&filters, 3)]);
    let placed = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap();

    assert_eq!(order_count(pool, buyer.id).await, 1);
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE order_id = $1")
        .bind(placed.order_id)
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(items, 3);

    let total: i64 = sqlx::query_scalar("SELECT total_cents FROM orders WHERE id = $1")
        .bind(placed.order_id)
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(total, request.total_cents);

    assert_eq!(stock_of(pool, CatalogKind::Supply, filters.id).await, 27);
}

#[tokio::test]
async fn test_insufficient_stock_rolls_back_everything() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let plenty = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 50).await;
    let scarce = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 1000, 1).await;

    let request = order_request(vec![line(&plenty, 5), line(&scarce, 2)]);
    let err = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap_err();

    assert_matches!(
        err,
        OrderError::InsufficientStock { item_id, available: 1, requested: 2, .. } if item_id == scarce.id
    );
    assert_contains!(err.to_string(), scarce.name.as_str());

    assert_eq!(order_count(pool, buyer.id).await, 0);
    assert_eq!(stock_of(pool, CatalogKind::Product, plenty.id).await, 50);
    assert_eq!(stock_of(pool, CatalogKind::Supply, scarce.id).await, 1);
}

#[tokio::test]
async fn test_unknown_item_rolls_back() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let real = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 5).await;

    let mut ghost = line(&real, 1);
    ghost.item_id = uuid::Uuid::new_v4();
    let ghost_id = ghost.item_id;

    let err = place_order(pool, buyer.id, &order_request(vec![line(&real, 1), ghost]), THRESHOLD)
        .await
        .unwrap_err();

    assert_matches!(err, OrderError::ItemUnavailable { item_id, .. } if item_id == ghost_id);
    assert_eq!(order_count(pool, buyer.id).await, 0);
    assert_eq!(stock_of(pool, CatalogKind::Product, real.id).await, 5);
}

#[tokio::test]
async fn test_repeated_item_lines_are_checked_together() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 5).await;

    let request = order_request(vec![line(&item, 3), line(&item, 3)]);
    let err = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap_err();

    assert_matches!(err, OrderError::InsufficientStock { available: 5, requested: 6, .. });
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 5);
}

#[tokio::test]
async fn test_two_concurrent_orders_cannot_overdraw_stock() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let first = create_test_user(pool, Role::Client).await;
    let second = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 5).await;

    let request = order_request(vec![line(&item, 3)]);
    let (a, b) = tokio::join!(
        place_order(pool, first.id, &request, THRESHOLD),
        place_order(pool, second.id, &request, THRESHOLD),
    );

    let results = [a, b];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);

    let failure = results.into_iter().find_map(Result::err).expect("one failure");
    assert_matches!(failure, OrderError::InsufficientStock { available: 2, requested: 3, .. });

    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 2);
    assert_eq!(order_count(pool, first.id).await + order_count(pool, second.id).await, 1);
}

#[tokio::test]
async fn test_many_concurrent_orders_sell_exactly_the_stock() {
    let db = require_db!();
    let pool = db.pool().clone();
    let supplier = create_test_user(&pool, Role::Supplier).await;
    let buyer = create_test_user(&pool, Role::Client).await;
    let item = create_catalog_item(&pool, CatalogKind::Supply, supplier.id, 450, 10).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = pool.clone();
        let request = order_request(vec![line(&item, 2)]);
        let buyer_id = buyer.id;
        handles.push(tokio::spawn(async move {
            place_order(&pool, buyer_id, &request, THRESHOLD).await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.expect("task") {
            Ok(_) => succeeded += 1,
            Err(e) => assert_matches!(e, OrderError::InsufficientStock { .. }),
        }
    }

    assert_eq!(succeeded, 5);
    assert_eq!(stock_of(&pool, CatalogKind::Supply, item.id).await, 0);
    assert_eq!(order_count(&pool, buyer.id).await, 5);
}

#[tokio::test]
async fn test_cancel_restores_stock_exactly() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 12).await;
    let kettle = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 9000, 4).await;

    let request = order_request(vec![line(&beans, 3), line(&kettle, 1), line(&beans, 2)]);
    let placed = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap();
    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 7);
    assert_eq!(stock_of(pool, CatalogKind::Supply, kettle.id).await, 3);

    cancel_order(pool, placed.order_id, buyer.id).await.expect("cancelled");

    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 12);
    assert_eq!(stock_of(pool, CatalogKind::Supply, kettle.id).await, 4);
    assert_eq!(order_status(pool, placed.order_id).await, "cancelled");
}

#[tokio::test]
async fn test_cancel_by_other_user_changes_nothing() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let stranger = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 10).await;

    let placed = place_order(pool, buyer.id, &order_request(vec![line(&item, 4)]), THRESHOLD)
        .await
        .unwrap();

    let err = cancel_order(pool, placed.order_id, stranger.id).await.unwrap_err();
    assert_matches!(err, OrderError::NotFound(id) if id == placed.order_id);

    assert_eq!(order_status(pool, placed.order_id).await, "pending");
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 6);
}

#[tokio::test]
async fn test_cancel_requires_pending() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 10).await;

    let placed = place_order(pool, buyer.id, &order_request(vec![line(&item, 2)]), THRESHOLD)
        .await
        .unwrap();

    let shipped = OrderStatusUpdate {
        status: OrderStatus::Shipped,
        shipping_company: Some("Servientrega".to_string()),
        tracking_number: Some("SV-001".to_string()),
    };
    update_order_status(pool, placed.order_id, &shipped).await.unwrap();

    let err = cancel_order(pool, placed.order_id, buyer.id).await.unwrap_err();
    assert_matches!(err, OrderError::NotCancellable { order_id } if order_id == placed.order_id);
    assert_eq!(order_status(pool, placed.order_id).await, "shipped");
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 8);
}

#[tokio::test]
async fn test_cancel_twice_is_rejected() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 1000, 3).await;

    let placed = place_order(pool, buyer.id, &order_request(vec![line(&item, 3)]), THRESHOLD)
        .await
        .unwrap();
    cancel_order(pool, placed.order_id, buyer.id).await.unwrap();

    let err = cancel_order(pool, placed.order_id, buyer.id).await.unwrap_err();
    assert_matches!(err, OrderError::NotCancellable { .. });
    assert_eq!(stock_of(pool, CatalogKind::Supply, item.id).await, 3);
}

#[tokio::test]
async fn test_suppliers_are_notified_after_commit() {
    let db = require_db!();
    let pool = db.pool();
    let roaster = create_test_user(pool, Role::Supplier).await;
    let outfitter = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, roaster.id, 1000, 12).await;
    let blend = create_catalog_item(pool, CatalogKind::Product, roaster.id, 1000, 40).await;
    let grinder = create_catalog_item(pool, CatalogKind::Supply, outfitter.id, 1000, 50).await;

    let request = order_request(vec![line(&beans, 3), line(&blend, 1), line(&grinder, 1)]);
    let placed = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap();

    let roaster_inbox = list_notifications(pool, roaster.id).await.unwrap();
    let new_orders: Vec<_> = roaster_inbox
        .iter()
        .filter(|n| n.link_url.as_deref() == Some("/supplier/orders"))
        .collect();
    assert_eq!(new_orders.len(), 1);
    assert_contains!(new_orders[0].message, format!("#{}", placed.order_id).as_str());

    let low_stock: Vec<_> = roaster_inbox
        .iter()
        .filter(|n| n.link_url.as_deref() == Some("/supplier/stats/low-stock"))
        .collect();
    assert_eq!(low_stock.len(), 1);
    assert_contains!(low_stock[0].message, beans.name.as_str());
    assert_contains!(low_stock[0].message, "9 units");

    let outfitter_inbox = list_notifications(pool, outfitter.id).await.unwrap();
    assert_eq!(outfitter_inbox.len(), 1);
    assert!(!outfitter_inbox[0].is_read);
}

#[tokio::test]
async fn test_failed_order_sends_no_notifications() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 1).await;

    let result = place_order(pool, buyer.id, &order_request(vec![line(&item, 2)]), THRESHOLD).await;
    assert!(result.is_err());

    assert!(list_notifications(pool, supplier.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_overflowing_item_total_is_rejected_without_touching_stock() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 5).await;

    let mut request = order_request(vec![line(&item, 1_500_000_000), line(&item, 1_500_000_000)]);
    request.total_cents = 0;

    let err = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap_err();

    assert_matches!(err, OrderError::Invalid(ref e) if e.field() == Some("quantity"));
    assert_eq!(order_count(pool, buyer.id).await, 0);
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 5);
}

#[tokio::test]
async fn test_cancelled_order_cannot_be_reopened_or_cancelled_again() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 10).await;

    let placed = place_order(pool, buyer.id, &order_request(vec![line(&item, 4)]), THRESHOLD)
        .await
        .unwrap();
    cancel_order(pool, placed.order_id, buyer.id).await.unwrap();
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 10);

    let err = update_order_status(pool, placed.order_id, &move_to(OrderStatus::Pending))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        OrderError::InvalidTransition { from: OrderStatus::Cancelled, to: OrderStatus::Pending, .. }
    );

    let err = cancel_order(pool, placed.order_id, buyer.id).await.unwrap_err();
    assert_matches!(err, OrderError::NotCancellable { .. });

    assert_eq!(order_status(pool, placed.order_id).await, "cancelled");
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 10);
}

#[tokio::test]
async fn test_admin_cancel_restores_stock_once() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let beans = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 10).await;
    let filters = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 300, 6).await;

    let request = order_request(vec![line(&beans, 3), line(&filters, 2)]);
    let placed = place_order(pool, buyer.id, &request, THRESHOLD).await.unwrap();
    update_order_status(pool, placed.order_id, &move_to(OrderStatus::Shipped)).await.unwrap();

    let change = update_order_status(pool, placed.order_id, &move_to(OrderStatus::Cancelled))
        .await
        .unwrap();
    assert_eq!(change.from, OrderStatus::Shipped);
    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 10);
    assert_eq!(stock_of(pool, CatalogKind::Supply, filters.id).await, 6);

    let again = update_order_status(pool, placed.order_id, &move_to(OrderStatus::Cancelled)).await;
    assert_matches!(again, Err(OrderError::InvalidTransition { .. }));
    assert_eq!(stock_of(pool, CatalogKind::Product, beans.id).await, 10);
}

#[tokio::test]
async fn test_delivered_order_cannot_be_cancelled() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Product, supplier.id, 1000, 10).await;

    let placed = place_order(pool, buyer.id, &order_request(vec![line(&item, 2)]), THRESHOLD)
        .await
        .unwrap();
    update_order_status(pool, placed.order_id, &move_to(OrderStatus::Delivered)).await.unwrap();

    let err = update_order_status(pool, placed.order_id, &move_to(OrderStatus::Cancelled))
        .await
        .unwrap_err();
    assert_matches!(err, OrderError::InvalidTransition { from: OrderStatus::Delivered, .. });
    assert_eq!(stock_of(pool, CatalogKind::Product, item.id).await, 8);

    let inbox = list_notifications(pool, buyer.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_contains!(inbox[0].message, "delivered");
}

#[tokio::test]
async fn test_deleting_open_order_releases_stock() {
    let db = require_db!();
    let pool = db.pool();
    let supplier = create_test_user(pool, Role::Supplier).await;
    let buyer = create_test_user(pool, Role::Client).await;
    let item = create_catalog_item(pool, CatalogKind::Supply, supplier.id, 1000, 7).await;

    let open = place_order(pool, buyer.id, &order_request(vec![line(&item, 3)]), THRESHOLD)
        .await
        .unwrap();
    let cancelled = place_order(pool, buyer.id, &order_request(vec![line(&item, 2)]), THRESHOLD)
        .await
        .unwrap();
    cancel_order(pool, cancelled.order_id, buyer.id).await.unwrap();
    assert_eq!(stock_of(pool, CatalogKind::Supply, item.id).await, 4);

    let deleted = delete_order(pool, open.order_id).await.unwrap().expect("deleted");
    assert!(deleted.stock_restored);
    assert_eq!(stock_of(pool, CatalogKind::Supply, item.id).await, 7);

    let deleted = delete_order(pool, cancelled.order_id).await.unwrap().expect("deleted");
    assert!(!deleted.stock_restored);
    assert_eq!(stock_of(pool, CatalogKind::Supply, item.id).await, 7);

    assert!(delete_order(pool, open.order_id).await.unwrap().is_none());
    assert_eq!(order_count(pool, buyer.id).await, 0);
}
