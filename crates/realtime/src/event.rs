//! Event payloads pushed to connected clients.

use common::{OrderId, OrderStatus, UserId};
use serde::Serialize;
use store::{OrderRecord, Product, Shipment};

/// A created order together with the placing user's display fields, as
/// shown on order dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct OrderNotice {
    #[serde(flatten)]
    pub order: OrderRecord,
    pub customer_name: String,
    pub customer_email: String,
}

/// One domain event as delivered over the real-time channel.
///
/// The wire form is a tagged JSON object, e.g.
/// `{"kind": "inventory_changed", "product": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A product's stock (or other catalog field) changed; carries the full
    /// updated snapshot.
    InventoryChanged { product: Product },
    /// An order was placed.
    OrderCreated { order: OrderNotice },
    /// The user's cart changed server-side. Informational: clients re-fetch
    /// the cart rather than reading it from the payload.
    CartUpdated { user_id: UserId },
    /// An admin moved an order through its lifecycle.
    OrderStatusChanged { order_id: OrderId, status: OrderStatus },
    /// A shipment's status, location, or notes changed.
    ShipmentUpdated { shipment: Shipment },
}

impl ServerEvent {
    /// Stable kind label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::InventoryChanged { .. } => "inventory_changed",
            ServerEvent::OrderCreated { .. } => "order_created",
            ServerEvent::CartUpdated { .. } => "cart_updated",
            ServerEvent::OrderStatusChanged { .. } => "order_status_changed",
            ServerEvent::ShipmentUpdated { .. } => "shipment_updated",
        }
    }
}

#[cfg(test)]
mod tests {
    use common::{FraudRisk, Money, ProductId};

    use super::*;

    #[test]
    fn events_serialize_with_kind_tag() {
        let event = ServerEvent::CartUpdated {
            user_id: UserId::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "cart_updated");
        assert!(json["user_id"].is_string());
    }

    #[test]
    fn inventory_event_carries_full_snapshot() {
        let event = ServerEvent::InventoryChanged {
            product: Product {
                id: ProductId::new(),
                name: "Widget".to_string(),
                sku: "SKU-001".to_string(),
                price: Money::from_cents(999),
                stock_quantity: 7,
                min_stock: 2,
                location: "A-01".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "inventory_changed");
        assert_eq!(json["product"]["stock_quantity"], 7);
        assert_eq!(json["product"]["name"], "Widget");
    }

    #[test]
    fn order_notice_flattens_order_fields() {
        let order = OrderRecord {
            id: OrderId::new(),
            user_id: UserId::new(),
            total_amount: Money::from_cents(5000),
            status: common::OrderStatus::Pending,
            tracking_number: "TRK-1".to_string(),
            shipping_address: "1 Main St".to_string(),
            fraud_risk: FraudRisk::Low,
            fraud_reasons: Vec::new(),
            order_date: chrono::Utc::now(),
        };
        let event = ServerEvent::OrderCreated {
            order: OrderNotice {
                order,
                customer_name: "Ada".to_string(),
                customer_email: "ada@example.com".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "order_created");
        assert_eq!(json["order"]["customer_name"], "Ada");
        assert_eq!(json["order"]["tracking_number"], "TRK-1");
    }
}
