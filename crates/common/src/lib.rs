//! Shared types for the order platform.
//!
//! Typed identifiers, fixed-point money, roles, and the lifecycle enums
//! used across the storage, domain, and API layers.

pub mod ids;
pub mod money;
pub mod status;

pub use ids::{OrderId, ProductId, ShipmentId, UserId};
pub use money::Money;
pub use status::{
    Actor, FraudRisk, InventoryTxKind, OrderStatus, ParseEnumError, Role, ShipmentStatus,
};
