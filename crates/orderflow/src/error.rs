//! Order flow error taxonomy.
//!
//! Every variant is a typed, caller-facing condition; the API layer maps
//! them to HTTP statuses. Unexpected storage faults stay wrapped in
//! [`OrderFlowError::Store`] and are reported generically.

use common::{OrderId, ProductId};
use store::StoreError;
use thiserror::Error;

/// Errors surfaced by the order, cart, inventory, and lifecycle services.
#[derive(Debug, Error)]
pub enum OrderFlowError {
    /// Malformed input, rejected before any storage write.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds live stock. Recoverable: the caller can
    /// correct the quantity and resubmit.
    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: i32,
    },

    /// The referenced order does not exist.
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// No shipment exists for the order.
    #[error("no shipment recorded for order {0}")]
    ShipmentNotFound(OrderId),

    /// The requested lifecycle change is not allowed from the current state.
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// A concurrent writer won; the caller should resubmit.
    #[error("conflicting update: {0}")]
    Conflict(String),

    /// Unexpected storage fault. Nothing was committed.
    #[error("storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ProductNotFound(id) => OrderFlowError::ProductNotFound(id),
            StoreError::InsufficientStock {
                product_id,
                name,
                requested,
                available,
            } => OrderFlowError::InsufficientStock {
                product_id,
                name,
                requested,
                available,
            },
            StoreError::OrderNotFound(id) => OrderFlowError::OrderNotFound(id),
            StoreError::ShipmentNotFound(id) => OrderFlowError::ShipmentNotFound(id),
            StoreError::NegativeStock(n) => {
                OrderFlowError::Validation(format!("stock cannot be negative: {n}"))
            }
            StoreError::Conflict(msg) => OrderFlowError::Conflict(msg),
            other => OrderFlowError::Store(other),
        }
    }
}

/// Result type for order flow operations.
pub type Result<T> = std::result::Result<T, OrderFlowError>;
