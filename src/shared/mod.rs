//! Shared types
//!
//! Request, response and domain types used by the backend and by any client
//! talking to the API. Nothing in here touches the database or HTTP.

/// Catalog items and catalog kinds
pub mod catalog;

/// Orders, cart lines and listing filters
pub mod order;

/// Roles and user profiles
pub mod user;

/// Cart requests and entries
pub mod cart;

/// Saved addresses
pub mod address;

/// In-app notifications
pub mod notification;

/// Supplier onboarding requests
pub mod supplier_request;

/// Product reviews
pub mod review;

/// Admin activity log
pub mod activity;

/// Field rules shared by several request types
pub mod validation;

/// Shared error types
pub mod error;

pub use activity::{ActivityEntry, ActivityFilters, AdminAction};
pub use catalog::{CatalogItem, CatalogItemInput, CatalogKind, StockUpdate};
pub use error::SharedError;
pub use order::{
    CartLine, OrderDetail, OrderFilters, OrderLine, OrderStatus, OrderStatusUpdate,
    OrderSummary, PlaceOrderRequest, PlacedOrderResponse, ShippingAddress,
};
pub use review::{Review, ReviewRequest};
pub use supplier_request::{
    SupplierDecision, SupplierDecisionRequest, SupplierDecisionResponse, SupplierRequest,
    SupplierRequestFilters, SupplierRequestInput, SupplierRequestStatus,
};
pub use user::{Role, UserListQuery, UserProfile, UserUpdate};
