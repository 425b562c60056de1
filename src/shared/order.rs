//! Order Data Structures
//!
//! Request and response types for placing, listing and updating orders.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::shared::catalog::CatalogKind;
use crate::shared::error::SharedError;

/// Lifecycle state of an order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, stock reserved, still cancellable by the buyer
    Pending,
    Processing,
    Shipped,
    Delivered,
    /// Cancelled; its stock was restored
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the order still holds the stock it reserved
    ///
    /// Delivered orders consumed it for good, cancelled ones gave it back.
    pub fn holds_stock(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether an admin or supplier may move an order from `self` to `next`
    ///
    /// `cancelled` is final and delivered goods cannot be cancelled. Setting
    /// the current status again is allowed so shipping details can change.
    pub fn allows_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::Cancelled, _) => false,
            (OrderStatus::Delivered, OrderStatus::Cancelled) => false,
            _ => true,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(SharedError::validation(
                "status",
                format!("unknown order status '{}'", other),
            )),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One cart line submitted at checkout
///
/// `unit_price_cents` is the price the buyer saw when the item went into the
/// cart. It is stored as the line's purchase price as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub item_id: Uuid,
    pub kind: CatalogKind,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

/// Shipping destination copied into the order
///
/// Known fields are typed; anything else the client sends is kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShippingAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Checkout request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderRequest {
    #[serde(alias = "cart_items")]
    pub lines: Vec<CartLine>,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    /// Client-computed total; recorded as given
    pub total_cents: i64,
}

impl PlaceOrderRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.lines.is_empty() {
            return Err(SharedError::validation("lines", "an order needs at least one line"));
        }
        for line in &self.lines {
            if line.quantity < 1 {
                return Err(SharedError::validation(
                    "quantity",
                    format!("quantity for item {} must be at least 1", line.item_id),
                ));
            }
            if line.unit_price_cents < 0 {
                return Err(SharedError::validation(
                    "unit_price_cents",
                    format!("price for item {} must not be negative", line.item_id),
                ));
            }
        }
        self.checked_demand().ok_or_else(|| {
            SharedError::validation("quantity", "total quantity per item is too large")
        })?;
        if self.payment_method.trim().is_empty() {
            return Err(SharedError::validation("payment_method", "must not be empty"));
        }
        if self.total_cents < 0 {
            return Err(SharedError::validation("total_cents", "must not be negative"));
        }
        Ok(())
    }

    /// Total requested quantity per catalog item, in a stable order
    ///
    /// The same item may appear on several lines; stock must cover their sum.
    /// Sums saturate at `i32::MAX`, which no stock level can satisfy;
    /// `validate` rejects such requests up front.
    pub fn demand(&self) -> BTreeMap<(CatalogKind, Uuid), i32> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            let total = demand.entry((line.kind, line.item_id)).or_insert(0i32);
            *total = total.saturating_add(line.quantity);
        }
        demand
    }

    /// Per-item sums, or `None` if one does not fit in an `i32`
    fn checked_demand(&self) -> Option<BTreeMap<(CatalogKind, Uuid), i32>> {
        let mut demand = BTreeMap::new();
        for line in &self.lines {
            let total = demand.entry((line.kind, line.item_id)).or_insert(0i32);
            *total = total.checked_add(line.quantity)?;
        }
        Some(demand)
    }
}

/// Response to a successful checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedOrderResponse {
    pub order_id: i64,
}

/// Status change issued by an admin or a supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
    #[serde(default)]
    pub shipping_company: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Query-string filters for order listings
///
/// Dates are inclusive calendar days. Empty values are treated as absent.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OrderFilters {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub end_date: Option<NaiveDate>,
}

impl OrderFilters {
    pub fn validate(&self) -> Result<(), SharedError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(SharedError::validation("start_date", "must not be after end_date"));
            }
        }
        Ok(())
    }

    /// Half-open `[from, until)` timestamp window covering the selected days
    pub fn window(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let from = self
            .start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let until = self
            .end_date
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        (from, until)
    }
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(de::Error::custom),
    }
}

/// Line of an order as shown in listings and details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub kind: CatalogKind,
    /// `None` once the catalog item has been deleted
    pub item_id: Option<Uuid>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub quantity: i32,
    pub price_at_purchase_cents: i64,
    /// The buyer has already reviewed this line
    #[serde(default)]
    pub is_reviewed: bool,
}

/// Order header with its lines, as listed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: i64,
    pub user_id: Uuid,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub shipping_company: Option<String>,
    pub tracking_number: Option<String>,
    /// Buyer's full name; filled for admin and supplier listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}

/// Full order view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderDetail {
    pub id: i64,
    pub user_id: Uuid,
    pub total_cents: i64,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub payment_method: String,
    pub shipping_company: Option<String>,
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderLine>,
}
