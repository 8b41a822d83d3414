//! Storage entities.
//!
//! These are the row-level types of the relational model. Request/response
//! DTOs live in the API crate; services pass these types around internally.

use chrono::{DateTime, Utc};
use common::{
    Actor, FraudRisk, InventoryTxKind, Money, OrderId, OrderStatus, ProductId, Role, ShipmentId,
    ShipmentStatus, UserId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog product with live stock.
///
/// `stock_quantity` is never assigned directly by order flow; every change
/// goes through a ledger operation so the transaction log stays consistent
/// with the live value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price: Money,
    pub stock_quantity: i32,
    /// Reorder threshold used by inventory dashboards.
    pub min_stock: i32,
    pub location: String,
}

impl Product {
    /// Returns true if stock has fallen to or below the reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock
    }
}

/// One line of a user's cart, joined with the product's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub tracking_number: String,
    pub shipping_address: String,
    pub fraud_risk: FraudRisk,
    pub fraud_reasons: Vec<String>,
    pub order_date: DateTime<Utc>,
}

/// One line of a placed order.
///
/// `unit_price_at_purchase` is a snapshot taken when the order was placed;
/// later catalog price changes must not affect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_at_purchase: Money,
}

/// The shipment record created alongside an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// One append-only audit row explaining a stock quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub product_id: ProductId,
    pub kind: InventoryTxKind,
    pub quantity_delta: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: String,
    pub created_by: Actor,
    pub created_at: DateTime<Utc>,
}

/// Display and identity fields for a user, owned by the excluded auth layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Ephemeral order-history snapshot for a user; feeds the fraud evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderHistory {
    pub total_orders: i64,
    pub total_spent: Money,
}

/// Result of an admin stock adjustment: the updated product snapshot and
/// the ledger row that explains the change.
#[derive(Debug, Clone)]
pub struct StockChange {
    pub product: Product,
    pub transaction: InventoryTransaction,
}

/// One line of an order about to be committed, with price and name
/// snapshotted from the catalog read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
}

/// A fully-assembled order awaiting atomic commit.
///
/// The coordinator computes everything here before the transaction starts;
/// the store re-checks stock inside the transaction and writes all rows or
/// none of them.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<DraftLine>,
    pub total_amount: Money,
    pub shipping_address: String,
    pub fraud_risk: FraudRisk,
    pub fraud_reasons: Vec<String>,
    pub tracking_number: String,
}

/// Everything written by a successful order commit, for the caller to
/// broadcast and return.
#[derive(Debug, Clone)]
pub struct CommittedOrder {
    pub order: OrderRecord,
    pub line_items: Vec<OrderLineItem>,
    pub shipment: Shipment,
    /// Updated product snapshots, one per draft line, in line order.
    pub products: Vec<Product>,
}
