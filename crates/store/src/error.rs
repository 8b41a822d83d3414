use common::{OrderId, ParseEnumError, ProductId, UserId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested quantity exceeds the live stock for a product.
    /// Recoverable, user-facing; aborts the enclosing operation.
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

    /// No shipment row exists for the order.
    #[error("no shipment recorded for order {0}")]
    ShipmentNotFound(OrderId),

    /// The referenced user does not exist.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// An adjustment asked for a negative stock target.
    #[error("stock cannot be negative: {0}")]
    NegativeStock(i32),

    /// A concurrent writer won; the caller should resubmit.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// A stored enum column held a value no variant matches.
    #[error("corrupt stored value: {0}")]
    Corrupt(#[from] ParseEnumError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
