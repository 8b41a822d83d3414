//! End-to-end order flow tests against the in-memory store.
//!
//! These cover the placement transaction's observable properties: all-or-
//! nothing commits, no oversell under concurrency, cart clearing exactly on
//! success, fraud banding, and the event fan-out contract.

use std::sync::Arc;

use common::{
    Actor, FraudRisk, InventoryTxKind, Money, OrderId, OrderStatus, ProductId, Role,
    ShipmentStatus, UserId,
};
use orderflow::{
    CartService, InventoryService, OrderAdminService, OrderCoordinator, OrderFlowError,
    OrderItemRequest, PlaceOrderRequest,
};
use realtime::{Broadcaster, ServerEvent, SessionRegistry};
use store::{MemoryStore, Product, Store, UserProfile};
use tokio::sync::mpsc::UnboundedReceiver;

struct Harness {
    store: MemoryStore,
    registry: Arc<SessionRegistry>,
    coordinator: OrderCoordinator<MemoryStore>,
    cart: CartService<MemoryStore>,
    inventory: InventoryService<MemoryStore>,
    admin: OrderAdminService<MemoryStore>,
    customer: UserProfile,
    widget: Product,
    gadget: Product,
    camera: Product,
}

async fn setup() -> Harness {
    let store = MemoryStore::new();
    let registry = Arc::new(SessionRegistry::new());
    let broadcaster = Broadcaster::new(registry.clone());

    let customer = UserProfile {
        id: UserId::new(),
        name: "Ada".to_string(),
        email: "ada@example.com".to_string(),
        role: Role::Customer,
    };
    store.insert_user(customer.clone()).await.unwrap();

    let widget = product("Widget", "SKU-001", 1_000, 10);
    let gadget = product("Gadget", "SKU-002", 2_500, 3);
    let camera = product("Camera", "SKU-003", 150_000, 5);
    for p in [&widget, &gadget, &camera] {
        store.insert_product(p.clone()).await.unwrap();
    }

    Harness {
        coordinator: OrderCoordinator::new(store.clone(), broadcaster.clone()),
        cart: CartService::new(store.clone(), broadcaster.clone()),
        inventory: InventoryService::new(store.clone(), broadcaster.clone()),
        admin: OrderAdminService::new(store.clone(), broadcaster.clone()),
        store,
        registry,
        customer,
        widget,
        gadget,
        camera,
    }
}

fn product(name: &str, sku: &str, price_cents: i64, stock: i32) -> Product {
    Product {
        id: ProductId::new(),
        name: name.to_string(),
        sku: sku.to_string(),
        price: Money::from_cents(price_cents),
        stock_quantity: stock,
        min_stock: 1,
        location: "A-01".to_string(),
    }
}

fn request(items: Vec<(ProductId, u32)>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items: items
            .into_iter()
            .map(|(product_id, quantity)| OrderItemRequest {
                product_id,
                quantity,
            })
            .collect(),
        shipping_address: "1 Main St".to_string(),
    }
}

fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[ServerEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.kind()).collect()
}

#[tokio::test]
async fn placement_commits_everything_and_fans_out_in_order() {
    let h = setup().await;
    let user = h.customer.id;

    h.cart.add(user, h.widget.id, 2).await.unwrap();
    h.cart.add(user, h.gadget.id, 1).await.unwrap();

    // register observers after the cart noise
    let (_owner, mut owner_rx) = h.registry.register(user, Role::Customer);
    let (_admin, mut admin_rx) = h.registry.register(UserId::new(), Role::Admin);
    let (_other, mut other_rx) = h.registry.register(UserId::new(), Role::Customer);

    let placed = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 2), (h.gadget.id, 1)]))
        .await
        .unwrap();

    assert_eq!(placed.order.total_amount.cents(), 2 * 1_000 + 2_500);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.shipment.status, ShipmentStatus::Pending);
    assert_eq!(placed.shipment.tracking_number, placed.order.tracking_number);
    assert!(placed.order.tracking_number.starts_with("TRK-"));
    assert_eq!(placed.line_items.len(), 2);

    // stock decremented and explained by exactly one sale row per line
    let widget_now = h.store.get_product(h.widget.id).await.unwrap().unwrap();
    assert_eq!(widget_now.stock_quantity, 8);
    let ledger = h.store.transactions_for_product(h.widget.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, InventoryTxKind::Sale);
    assert_eq!(ledger[0].previous_quantity, 10);
    assert_eq!(ledger[0].new_quantity, 8);

    // cart cleared as part of the commit
    assert!(h.cart.lines(user).await.unwrap().is_empty());

    // owner sees: per-product inventory, the order, then the cart notice
    let owner_events = drain(&mut owner_rx);
    assert_eq!(
        kinds(&owner_events),
        vec![
            "inventory_changed",
            "inventory_changed",
            "order_created",
            "cart_updated"
        ]
    );
    match &owner_events[2] {
        ServerEvent::OrderCreated { order } => {
            assert_eq!(order.customer_name, "Ada");
            assert_eq!(order.order.id, placed.order.id);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    // admins see inventory and the order, not the cart notice
    assert_eq!(
        kinds(&drain(&mut admin_rx)),
        vec!["inventory_changed", "inventory_changed", "order_created"]
    );

    // unrelated customers see only the inventory changes
    assert_eq!(
        kinds(&drain(&mut other_rx)),
        vec!["inventory_changed", "inventory_changed"]
    );
}

#[tokio::test]
async fn first_time_high_value_order_is_flagged_high_risk() {
    let h = setup().await;
    let user = h.customer.id;

    let placed = h
        .coordinator
        .place_order(user, request(vec![(h.camera.id, 1)]))
        .await
        .unwrap();

    // 40 (over $1000) + 50 (first order over $500) = 90
    assert_eq!(placed.order.fraud_risk, FraudRisk::High);
    assert_eq!(placed.order.fraud_reasons.len(), 2);
    assert!(placed.order.fraud_reasons[0].contains("High order value"));
    assert!(placed.order.fraud_reasons[1].contains("first-time customer"));

    // a second, small order is no longer first-time
    let placed = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 1)]))
        .await
        .unwrap();
    assert_eq!(placed.order.fraud_risk, FraudRisk::Low);
    assert!(placed.order.fraud_reasons.is_empty());
}

#[tokio::test]
async fn concurrent_orders_cannot_oversell() {
    let h = setup().await;
    let other = UserProfile {
        id: UserId::new(),
        name: "Grace".to_string(),
        email: "grace@example.com".to_string(),
        role: Role::Customer,
    };
    h.store.insert_user(other.clone()).await.unwrap();

    // gadget stock is 3; both ask for 2
    let (a, b) = tokio::join!(
        h.coordinator
            .place_order(h.customer.id, request(vec![(h.gadget.id, 2)])),
        h.coordinator
            .place_order(other.id, request(vec![(h.gadget.id, 2)])),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|s| **s).count();
    assert_eq!(successes, 1);

    let failure = if a.is_err() {
        a.unwrap_err()
    } else {
        b.unwrap_err()
    };
    match failure {
        OrderFlowError::InsufficientStock {
            requested,
            available,
            ..
        } => {
            assert_eq!(requested, 2);
            assert!(available == 1 || available == 3);
        }
        other => panic!("unexpected error: {other}"),
    }

    let gadget_now = h.store.get_product(h.gadget.id).await.unwrap().unwrap();
    assert_eq!(gadget_now.stock_quantity, 1);

    let total_orders = h.store.order_history(h.customer.id).await.unwrap().total_orders
        + h.store.order_history(other.id).await.unwrap().total_orders;
    assert_eq!(total_orders, 1);
}

#[tokio::test]
async fn unknown_product_aborts_the_whole_order() {
    let h = setup().await;
    let user = h.customer.id;
    h.cart.add(user, h.widget.id, 1).await.unwrap();

    let ghost = ProductId::new();
    let err = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 1), (ghost, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::ProductNotFound(id) if id == ghost));

    // the valid line was not reserved, no order exists, cart unchanged
    let widget_now = h.store.get_product(h.widget.id).await.unwrap().unwrap();
    assert_eq!(widget_now.stock_quantity, 10);
    assert_eq!(h.store.order_history(user).await.unwrap().total_orders, 0);
    assert_eq!(h.cart.lines(user).await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_placement_leaves_cart_intact_until_a_retry_succeeds() {
    let h = setup().await;
    let user = h.customer.id;
    h.cart.add(user, h.gadget.id, 2).await.unwrap();

    let err = h
        .coordinator
        .place_order(user, request(vec![(h.gadget.id, 5)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::InsufficientStock { .. }));
    assert_eq!(h.cart.lines(user).await.unwrap().len(), 1);

    h.coordinator
        .place_order(user, request(vec![(h.gadget.id, 2)]))
        .await
        .unwrap();
    assert!(h.cart.lines(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn validation_rejects_before_any_storage_access() {
    let h = setup().await;
    let user = h.customer.id;

    let err = h
        .coordinator
        .place_order(user, request(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));

    let err = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 0)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));

    let err = h
        .coordinator
        .place_order(
            user,
            PlaceOrderRequest {
                items: vec![OrderItemRequest {
                    product_id: h.widget.id,
                    quantity: 1,
                }],
                shipping_address: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));

    let err = h
        .coordinator
        .place_order(UserId::new(), request(vec![(h.widget.id, 1)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));
}

#[tokio::test]
async fn cart_add_validates_merged_quantity_against_stock() {
    let h = setup().await;
    let user = h.customer.id;

    h.cart.add(user, h.gadget.id, 2).await.unwrap();
    let err = h.cart.add(user, h.gadget.id, 2).await.unwrap_err();
    assert!(matches!(
        err,
        OrderFlowError::InsufficientStock {
            requested: 4,
            available: 3,
            ..
        }
    ));

    let err = h.cart.add(user, ProductId::new(), 1).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::ProductNotFound(_)));

    let err = h.cart.add(user, h.widget.id, 0).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));
}

#[tokio::test]
async fn cart_set_quantity_zero_removes_the_line() {
    let h = setup().await;
    let user = h.customer.id;

    h.cart.add(user, h.widget.id, 2).await.unwrap();
    let line = h
        .cart
        .set_quantity(user, h.widget.id, 5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(line.quantity, 5);

    let removed = h.cart.set_quantity(user, h.widget.id, 0).await.unwrap();
    assert!(removed.is_none());
    assert!(h.cart.lines(user).await.unwrap().is_empty());

    let err = h
        .cart
        .set_quantity(user, h.widget.id, 11)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::InsufficientStock { .. }));
}

#[tokio::test]
async fn stock_adjustment_broadcasts_updated_snapshot() {
    let h = setup().await;
    let (_s, mut rx) = h.registry.register(UserId::new(), Role::Customer);

    let change = h
        .inventory
        .adjust_stock(Actor::System, h.widget.id, 40, "weekly restock")
        .await
        .unwrap();
    assert_eq!(change.transaction.kind, InventoryTxKind::Restock);

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec!["inventory_changed"]);
    match &events[0] {
        ServerEvent::InventoryChanged { product } => {
            assert_eq!(product.stock_quantity, 40);
        }
        other => panic!("unexpected event: {other:?}"),
    }

    let err = h
        .inventory
        .adjust_stock(Actor::System, h.widget.id, -3, "bad")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::Validation(_)));
}

#[tokio::test]
async fn order_lifecycle_follows_the_state_machine() {
    let h = setup().await;
    let user = h.customer.id;
    let placed = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 1)]))
        .await
        .unwrap();
    let order_id = placed.order.id;

    let (_owner, mut owner_rx) = h.registry.register(user, Role::Customer);

    // pending -> shipped is not legal
    let err = h
        .admin
        .update_order_status(order_id, OrderStatus::Shipped)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { .. }));

    let updated = h
        .admin
        .update_order_status(order_id, OrderStatus::Processing)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Processing);

    // cancellation is allowed from any non-terminal state
    let updated = h
        .admin
        .update_order_status(order_id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Cancelled);

    let err = h
        .admin
        .update_order_status(order_id, OrderStatus::Processing)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { .. }));

    let events = drain(&mut owner_rx);
    assert_eq!(
        kinds(&events),
        vec!["order_status_changed", "order_status_changed"]
    );
}

#[tokio::test]
async fn shipment_lifecycle_updates_and_notifies_owner() {
    let h = setup().await;
    let user = h.customer.id;
    let placed = h
        .coordinator
        .place_order(user, request(vec![(h.widget.id, 1)]))
        .await
        .unwrap();
    let order_id = placed.order.id;

    let (_owner, mut owner_rx) = h.registry.register(user, Role::Customer);

    let err = h
        .admin
        .update_shipment_status(order_id, ShipmentStatus::Delivered, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::InvalidTransition { .. }));

    h.admin
        .update_shipment_status(
            order_id,
            ShipmentStatus::InTransit,
            Some("regional hub".to_string()),
            None,
        )
        .await
        .unwrap();
    h.admin
        .update_shipment_status(order_id, ShipmentStatus::OutForDelivery, None, None)
        .await
        .unwrap();
    let delivered = h
        .admin
        .update_shipment_status(
            order_id,
            ShipmentStatus::Delivered,
            None,
            Some("left at door".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(delivered.status, ShipmentStatus::Delivered);
    assert!(delivered.actual_delivery.is_some());
    assert_eq!(kinds(&drain(&mut owner_rx)), vec![
        "shipment_updated",
        "shipment_updated",
        "shipment_updated"
    ]);

    let err = h
        .admin
        .update_shipment_status(OrderId::new(), ShipmentStatus::InTransit, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderFlowError::OrderNotFound(_)));
}
