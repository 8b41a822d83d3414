//! Roles, lifecycle enums, and audit classifications.
//!
//! The lifecycle enums carry their own transition rules so that every layer
//! (storage, services, API) agrees on which status changes are legal.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::UserId;

/// Returned when a stored enum value does not match any known variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Role attached to an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(ParseEnumError {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Who performed a stock mutation: a known user or the system itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    User(UserId),
    System,
}

impl Actor {
    /// Stable string form used for the audit log's `created_by` column.
    pub fn as_audit_string(&self) -> String {
        match self {
            Actor::User(id) => id.to_string(),
            Actor::System => "system".to_string(),
        }
    }

    /// Parses the audit-column form back into an actor.
    pub fn from_audit_string(s: &str) -> Result<Self, ParseEnumError> {
        if s == "system" {
            return Ok(Actor::System);
        }
        uuid::Uuid::parse_str(s)
            .map(|u| Actor::User(UserId::from_uuid(u)))
            .map_err(|_| ParseEnumError {
                kind: "actor",
                value: s.to_string(),
            })
    }
}

/// The state of an order in its lifecycle.
///
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///    │            │             │
///    └────────────┴─────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order has been placed and awaits fulfillment.
    #[default]
    Pending,
    /// Order is being picked and packed.
    Processing,
    /// Order has left the warehouse.
    Shipped,
    /// Order reached the customer (terminal).
    Delivered,
    /// Order was cancelled (terminal).
    Cancelled,
}

impl OrderStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns true if the transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if next == OrderStatus::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Shipped)
                | (OrderStatus::Shipped, OrderStatus::Delivered)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// The state of a shipment, independent of its order's lifecycle.
///
/// ```text
/// Pending ──► InTransit ──► OutForDelivery ──► Delivered
///                 │    ▲          │    ▲
///                 │    └──────────┼────┤
///                 └──► FailedAttempt ──┘
/// ```
///
/// `Cancelled` is reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Shipment record created, not yet handed to the carrier.
    #[default]
    Pending,
    /// Carrier has the package.
    InTransit,
    /// On the delivery vehicle.
    OutForDelivery,
    /// Delivered to the customer (terminal).
    Delivered,
    /// A delivery attempt failed; retry pending.
    FailedAttempt,
    /// Shipment cancelled (terminal).
    Cancelled,
}

impl ShipmentStatus {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ShipmentStatus::Delivered | ShipmentStatus::Cancelled)
    }

    /// Returns true if the transition from `self` to `next` is allowed.
    pub fn can_transition_to(&self, next: ShipmentStatus) -> bool {
        if next == ShipmentStatus::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (ShipmentStatus::Pending, ShipmentStatus::InTransit)
                | (ShipmentStatus::InTransit, ShipmentStatus::OutForDelivery)
                | (ShipmentStatus::InTransit, ShipmentStatus::FailedAttempt)
                | (ShipmentStatus::OutForDelivery, ShipmentStatus::Delivered)
                | (ShipmentStatus::OutForDelivery, ShipmentStatus::FailedAttempt)
                | (ShipmentStatus::FailedAttempt, ShipmentStatus::InTransit)
                | (ShipmentStatus::FailedAttempt, ShipmentStatus::OutForDelivery)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "pending",
            ShipmentStatus::InTransit => "in_transit",
            ShipmentStatus::OutForDelivery => "out_for_delivery",
            ShipmentStatus::Delivered => "delivered",
            ShipmentStatus::FailedAttempt => "failed_attempt",
            ShipmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShipmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ShipmentStatus::Pending),
            "in_transit" => Ok(ShipmentStatus::InTransit),
            "out_for_delivery" => Ok(ShipmentStatus::OutForDelivery),
            "delivered" => Ok(ShipmentStatus::Delivered),
            "failed_attempt" => Ok(ShipmentStatus::FailedAttempt),
            "cancelled" => Ok(ShipmentStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "shipment status",
                value: other.to_string(),
            }),
        }
    }
}

/// Risk band assigned to an order by the fraud evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudRisk {
    Low,
    Medium,
    High,
}

impl FraudRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudRisk::Low => "low",
            FraudRisk::Medium => "medium",
            FraudRisk::High => "high",
        }
    }
}

impl std::fmt::Display for FraudRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FraudRisk {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(FraudRisk::Low),
            "medium" => Ok(FraudRisk::Medium),
            "high" => Ok(FraudRisk::High),
            other => Err(ParseEnumError {
                kind: "fraud risk",
                value: other.to_string(),
            }),
        }
    }
}

/// Classification of one inventory ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryTxKind {
    /// Stock consumed by a placed order.
    Sale,
    /// Stock increased by an admin restock.
    Restock,
    /// Manual correction in either direction.
    Adjustment,
}

impl InventoryTxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryTxKind::Sale => "sale",
            InventoryTxKind::Restock => "restock",
            InventoryTxKind::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for InventoryTxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InventoryTxKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(InventoryTxKind::Sale),
            "restock" => Ok(InventoryTxKind::Restock),
            "adjustment" => Ok(InventoryTxKind::Adjustment),
            other => Err(ParseEnumError {
                kind: "inventory transaction kind",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn order_cancel_from_any_non_terminal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn shipment_happy_path() {
        assert!(ShipmentStatus::Pending.can_transition_to(ShipmentStatus::InTransit));
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn shipment_failed_attempt_branches() {
        assert!(ShipmentStatus::InTransit.can_transition_to(ShipmentStatus::FailedAttempt));
        assert!(ShipmentStatus::OutForDelivery.can_transition_to(ShipmentStatus::FailedAttempt));
        assert!(ShipmentStatus::FailedAttempt.can_transition_to(ShipmentStatus::OutForDelivery));
        assert!(!ShipmentStatus::Pending.can_transition_to(ShipmentStatus::FailedAttempt));
        assert!(!ShipmentStatus::FailedAttempt.can_transition_to(ShipmentStatus::Delivered));
    }

    #[test]
    fn shipment_terminal_states() {
        assert!(ShipmentStatus::Delivered.is_terminal());
        assert!(ShipmentStatus::Cancelled.is_terminal());
        assert!(!ShipmentStatus::FailedAttempt.is_terminal());
        assert!(!ShipmentStatus::Delivered.can_transition_to(ShipmentStatus::Cancelled));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        for status in [
            ShipmentStatus::Pending,
            ShipmentStatus::InTransit,
            ShipmentStatus::OutForDelivery,
            ShipmentStatus::Delivered,
            ShipmentStatus::FailedAttempt,
            ShipmentStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<ShipmentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_value_is_an_error() {
        let err = "draft".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.value, "draft");
    }

    #[test]
    fn actor_audit_round_trip() {
        let user = UserId::new();
        let actor = Actor::User(user);
        let s = actor.as_audit_string();
        assert_eq!(Actor::from_audit_string(&s).unwrap(), actor);
        assert_eq!(
            Actor::from_audit_string("system").unwrap(),
            Actor::System
        );
        assert!(Actor::from_audit_string("not-a-uuid").is_err());
    }

    #[test]
    fn wire_serialization_is_snake_case() {
        assert_eq!(
            serde_json::to_string(&ShipmentStatus::OutForDelivery).unwrap(),
            "\"out_for_delivery\""
        );
        assert_eq!(serde_json::to_string(&FraudRisk::High).unwrap(), "\"high\"");
    }
}
