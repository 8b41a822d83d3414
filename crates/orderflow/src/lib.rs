//! Order flow services: the placement coordinator and the cart, inventory,
//! and lifecycle services around it.
//!
//! The coordinator owns the one path where multi-entity atomicity matters;
//! the other services are thin validation-and-broadcast wrappers over the
//! store.

pub mod admin;
pub mod cart;
pub mod coordinator;
pub mod error;
pub mod inventory;

pub use admin::OrderAdminService;
pub use cart::CartService;
pub use coordinator::{OrderCoordinator, OrderItemRequest, PlaceOrderRequest, PlacedOrder};
pub use error::{OrderFlowError, Result};
pub use inventory::InventoryService;
