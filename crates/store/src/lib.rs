//! Transactional storage layer for the order platform.
//!
//! Exposes the [`Store`] trait with two backends: [`MemoryStore`] for the
//! dev server and fast tests, and [`PostgresStore`] backed by sqlx. The
//! order-commit path is a single atomic unit in both.

pub mod entities;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use entities::{
    CartLine, CommittedOrder, DraftLine, InventoryTransaction, OrderDraft, OrderHistory,
    OrderLineItem, OrderRecord, Product, Shipment, StockChange, UserProfile,
};
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::Store;
