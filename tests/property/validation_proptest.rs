//! Property-based tests for request validation and order aggregation

#![cfg(feature = "ssr")]

use brewmarket::backend::auth::handlers::RegisterRequest;
use brewmarket::backend::orders::{plan_notifications, StockChange};
use brewmarket::shared::{
    CartLine, CatalogKind, OrderFilters, PlaceOrderRequest, ShippingAddress,
};
use chrono::NaiveDate;
use proptest::prelude::*;
use uuid::Uuid;

fn kind_strategy() -> impl Strategy<Value = CatalogKind> {
    prop_oneof![Just(CatalogKind::Product), Just(CatalogKind::Supply)]
}

/// Lines drawn from a small pool of items so repeats are common
fn lines_strategy(quantity: impl Strategy<Value = i32> + Clone) -> impl Strategy<Value = Vec<CartLine>> {
    let items: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
    prop::collection::vec(
        (0..items.len(), kind_strategy(), quantity, 0i64..100_000),
        1..12,
    )
    .prop_map(move |raw| {
        raw.into_iter()
            .map(|(i, kind, quantity, unit_price_cents)| CartLine {
                item_id: items[i],
                kind,
                quantity,
                unit_price_cents,
            })
            .collect()
    })
}

fn request(lines: Vec<CartLine>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        lines,
        shipping_address: ShippingAddress::default(),
        payment_method: "card".to_string(),
        total_cents: 0,
    }
}

proptest! {
    #[test]
    fn positive_quantities_validate(lines in lines_strategy(1i32..50)) {
        prop_assert!(request(lines).validate().is_ok());
    }

    #[test]
    fn any_non_positive_quantity_is_rejected(
        mut lines in lines_strategy(1i32..50),
        bad in -5i32..=0,
        index in any::<prop::sample::Index>(),
    ) {
        let i = index.index(lines.len());
        lines[i].quantity = bad;
        let err = request(lines).validate().unwrap_err();
        prop_assert_eq!(err.field(), Some("quantity"));
    }

    #[test]
    fn demand_preserves_total_quantity(lines in lines_strategy(1i32..50)) {
        let total: i32 = lines.iter().map(|l| l.quantity).sum();
        let req = request(lines);
        let demand = req.demand();

        prop_assert_eq!(demand.values().sum::<i32>(), total);
        for line in &req.lines {
            prop_assert!(demand[&(line.kind, line.item_id)] >= line.quantity);
        }
    }

    #[test]
    fn filter_window_covers_whole_days(start_offset in 0i64..3000, span in 0i64..400) {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let start = base + chrono::Duration::days(start_offset);
        let end = start + chrono::Duration::days(span);
        let filters = OrderFilters { status: None, start_date: Some(start), end_date: Some(end) };

        prop_assert!(filters.validate().is_ok());
        let (from, until) = filters.window();
        let (from, until) = (from.unwrap(), until.unwrap());
        prop_assert_eq!(until - from, chrono::Duration::days(span + 1));
    }

    #[test]
    fn every_touched_supplier_gets_one_new_order_notice(
        remaining in prop::collection::vec((0usize..3, 0i32..40), 1..10),
        threshold in 0i32..20,
    ) {
        let suppliers: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let changes: Vec<StockChange> = remaining
            .iter()
            .map(|&(s, left)| StockChange {
                kind: CatalogKind::Product,
                item_id: Uuid::new_v4(),
                name: "item".to_string(),
                supplier_id: suppliers[s],
                remaining: left,
            })
            .collect();

        let planned = plan_notifications(1, &changes, threshold);
        let low = changes.iter().filter(|c| c.remaining <= threshold).count();
        let touched: std::collections::BTreeSet<Uuid> = changes.iter().map(|c| c.supplier_id).collect();

        prop_assert_eq!(planned.len(), low + touched.len());
        for supplier in touched {
            let new_order = planned
                .iter()
                .filter(|n| n.user_id == supplier && n.link_url == "/supplier/orders")
                .count();
            prop_assert_eq!(new_order, 1);
        }
    }

    #[test]
    fn ten_digit_phones_are_accepted(phone in "[0-9]{10}") {
        let req = RegisterRequest {
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            phone,
            email: "ana@brewmarket.test".to_string(),
            password: "Espresso#42".to_string(),
        };
        prop_assert!(req.validate().is_ok());
    }

    #[test]
    fn other_phone_lengths_are_rejected(phone in "[0-9]{0,9}|[0-9]{11,14}") {
        let req = RegisterRequest {
            first_name: "Ana".to_string(),
            last_name: "Rojas".to_string(),
            phone,
            email: "ana@brewmarket.test".to_string(),
            password: "Espresso#42".to_string(),
        };
        let err = req.validate().unwrap_err();
        prop_assert_eq!(err.field(), Some("phone"));
    }

    #[test]
    fn per_item_totals_past_i32_are_rejected(
        kind in kind_strategy(),
        first in (i32::MAX / 2 + 1)..=i32::MAX,
        second in (i32::MAX / 2 + 1)..=i32::MAX,
    ) {
        let item_id = Uuid::new_v4();
        let line = |quantity| CartLine { item_id, kind, quantity, unit_price_cents: 100 };
        let req = request(vec![line(first), line(second)]);

        let err = req.validate().unwrap_err();
        prop_assert_eq!(err.field(), Some("quantity"));
        prop_assert_eq!(req.demand()[&(kind, item_id)], i32::MAX);
    }
}
