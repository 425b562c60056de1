//! Order domain errors

use thiserror::Error;
use uuid::Uuid;

use crate::shared::{CatalogKind, OrderStatus, SharedError};

/// Failures of order placement, cancellation and order updates
///
/// Every variant produced inside a placement or cancellation transaction
/// means the transaction was rolled back and nothing changed.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The referenced catalog item does not exist
    #[error("{kind} {item_id} is not available")]
    ItemUnavailable { kind: CatalogKind, item_id: Uuid },

    /// Current stock does not cover the requested quantity
    #[error("Insufficient stock for \"{name}\": {available} available, {requested} requested")]
    InsufficientStock {
        item_id: Uuid,
        name: String,
        available: i32,
        requested: i32,
    },

    /// The request failed validation; nothing was read or written
    #[error(transparent)]
    Invalid(#[from] SharedError),

    /// The order is not pending or does not belong to the caller
    #[error("Order {order_id} cannot be cancelled")]
    NotCancellable { order_id: i64 },

    /// Status change that would corrupt stock accounting
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Order {0} not found")]
    NotFound(i64),

    /// The order contains none of the supplier's items
    #[error("Order {0} contains none of your items")]
    NotSupplierOrder(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
