//! In-memory store implementation.
//!
//! Used by the dev server and the fast test suites. All state sits behind a
//! single write lock, so the commit path is trivially atomic: every line is
//! validated before the first mutation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{Actor, InventoryTxKind, OrderId, OrderStatus, ProductId, ShipmentId, ShipmentStatus, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::entities::{
    CartLine, CommittedOrder, InventoryTransaction, OrderDraft, OrderHistory, OrderLineItem,
    OrderRecord, Product, Shipment, StockChange, UserProfile,
};
use crate::store::{ESTIMATED_DELIVERY_DAYS, Store};
use crate::{Result, StoreError};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, UserProfile>,
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, HashMap<ProductId, u32>>,
    orders: HashMap<OrderId, OrderRecord>,
    line_items: Vec<OrderLineItem>,
    shipments: HashMap<OrderId, Shipment>,
    transactions: Vec<InventoryTransaction>,
}

/// In-memory store with the same contract as the PostgreSQL backend.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn joined_cart_line(
        state: &MemoryState,
        user: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        let product = state
            .products
            .get(&product_id)
            .ok_or(StoreError::ProductNotFound(product_id))?;
        Ok(CartLine {
            user_id: user,
            product_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity,
        })
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: UserProfile) -> Result<()> {
        self.state.write().await.users.insert(user.id, user);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<_> = state.products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.state.write().await.products.insert(product.id, product);
        Ok(())
    }

    async fn adjust_stock(
        &self,
        id: ProductId,
        new_quantity: i32,
        reason: &str,
        actor: Actor,
    ) -> Result<StockChange> {
        if new_quantity < 0 {
            return Err(StoreError::NegativeStock(new_quantity));
        }

        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or(StoreError::ProductNotFound(id))?;

        let previous = product.stock_quantity;
        product.stock_quantity = new_quantity;
        let snapshot = product.clone();

        let transaction = InventoryTransaction {
            id: Uuid::new_v4(),
            product_id: id,
            kind: if new_quantity > previous {
                InventoryTxKind::Restock
            } else {
                InventoryTxKind::Adjustment
            },
            quantity_delta: new_quantity - previous,
            previous_quantity: previous,
            new_quantity,
            reason: reason.to_string(),
            created_by: actor,
            created_at: Utc::now(),
        };
        state.transactions.push(transaction.clone());

        Ok(StockChange {
            product: snapshot,
            transaction,
        })
    }

    async fn transactions_for_product(
        &self,
        id: ProductId,
    ) -> Result<Vec<InventoryTransaction>> {
        let state = self.state.read().await;
        let mut rows: Vec<_> = state
            .transactions
            .iter()
            .filter(|t| t.product_id == id)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }

    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>> {
        let state = self.state.read().await;
        let Some(cart) = state.carts.get(&user) else {
            return Ok(Vec::new());
        };
        let mut lines = cart
            .iter()
            .map(|(product_id, quantity)| {
                Self::joined_cart_line(&state, user, *product_id, *quantity)
            })
            .collect::<Result<Vec<_>>>()?;
        lines.sort_by(|a, b| a.product_name.cmp(&b.product_name));
        Ok(lines)
    }

    async fn get_cart_line(&self, user: UserId, product: ProductId) -> Result<Option<CartLine>> {
        let state = self.state.read().await;
        match state.carts.get(&user).and_then(|c| c.get(&product)) {
            Some(quantity) => Ok(Some(Self::joined_cart_line(&state, user, product, *quantity)?)),
            None => Ok(None),
        }
    }

    async fn upsert_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        let mut state = self.state.write().await;
        if !state.products.contains_key(&product) {
            return Err(StoreError::ProductNotFound(product));
        }
        state.carts.entry(user).or_default().insert(product, quantity);
        Self::joined_cart_line(&state, user, product, quantity)
    }

    async fn delete_cart_line(&self, user: UserId, product: ProductId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .carts
            .get_mut(&user)
            .is_some_and(|c| c.remove(&product).is_some()))
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64> {
        let mut state = self.state.write().await;
        Ok(state
            .carts
            .remove(&user)
            .map(|c| c.len() as u64)
            .unwrap_or(0))
    }

    async fn order_history(&self, user: UserId) -> Result<OrderHistory> {
        let state = self.state.read().await;
        let mut total_orders = 0;
        let mut total_spent = common::Money::zero();
        for order in state.orders.values().filter(|o| o.user_id == user) {
            total_orders += 1;
            total_spent += order.total_amount;
        }
        Ok(OrderHistory {
            total_orders,
            total_spent,
        })
    }

    async fn commit_order(&self, draft: OrderDraft) -> Result<CommittedOrder> {
        let mut state = self.state.write().await;

        // Validate every line before touching anything, so a failed commit
        // leaves no partial state behind. Lines naming the same product
        // count against the same stock.
        let mut required: HashMap<ProductId, i32> = HashMap::new();
        for line in &draft.lines {
            let product = state
                .products
                .get(&line.product_id)
                .ok_or(StoreError::ProductNotFound(line.product_id))?;
            let needed = required.entry(line.product_id).or_insert(0);
            *needed += line.quantity as i32;
            if product.stock_quantity < *needed {
                return Err(StoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    requested: line.quantity,
                    available: product.stock_quantity,
                });
            }
        }
        if state
            .orders
            .values()
            .any(|o| o.tracking_number == draft.tracking_number)
        {
            return Err(StoreError::Conflict(format!(
                "tracking number {} already exists",
                draft.tracking_number
            )));
        }

        let now = Utc::now();
        let order = OrderRecord {
            id: draft.order_id,
            user_id: draft.user_id,
            total_amount: draft.total_amount,
            status: OrderStatus::Pending,
            tracking_number: draft.tracking_number.clone(),
            shipping_address: draft.shipping_address.clone(),
            fraud_risk: draft.fraud_risk,
            fraud_reasons: draft.fraud_reasons.clone(),
            order_date: now,
        };
        state.orders.insert(order.id, order.clone());

        let mut line_items = Vec::with_capacity(draft.lines.len());
        let mut products = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let item = OrderLineItem {
                id: Uuid::new_v4(),
                order_id: draft.order_id,
                product_id: line.product_id,
                product_name: line.product_name.clone(),
                quantity: line.quantity,
                unit_price_at_purchase: line.unit_price,
            };
            state.line_items.push(item.clone());
            line_items.push(item);

            let product = state
                .products
                .get_mut(&line.product_id)
                .ok_or(StoreError::ProductNotFound(line.product_id))?;
            let previous = product.stock_quantity;
            product.stock_quantity -= line.quantity as i32;
            let new_quantity = product.stock_quantity;
            products.push(product.clone());

            state.transactions.push(InventoryTransaction {
                id: Uuid::new_v4(),
                product_id: line.product_id,
                kind: InventoryTxKind::Sale,
                quantity_delta: -(line.quantity as i32),
                previous_quantity: previous,
                new_quantity,
                reason: format!("sale for order {}", draft.order_id),
                created_by: Actor::User(draft.user_id),
                created_at: now,
            });
        }

        let shipment = Shipment {
            id: ShipmentId::new(),
            order_id: draft.order_id,
            tracking_number: draft.tracking_number.clone(),
            status: ShipmentStatus::Pending,
            current_location: None,
            estimated_delivery: Some(now + Duration::days(ESTIMATED_DELIVERY_DAYS)),
            actual_delivery: None,
            notes: None,
        };
        state.shipments.insert(draft.order_id, shipment.clone());

        state.carts.remove(&draft.user_id);

        Ok(CommittedOrder {
            order,
            line_items,
            shipment,
            products,
        })
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn order_line_items(&self, id: OrderId) -> Result<Vec<OrderLineItem>> {
        let state = self.state.read().await;
        Ok(state
            .line_items
            .iter()
            .filter(|i| i.order_id == id)
            .cloned()
            .collect())
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .orders
            .values()
            .filter(|o| o.user_id == user)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.order_date.cmp(&a.order_date));
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderRecord> {
        let mut state = self.state.write().await;
        let order = state
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        if order.status != from {
            return Err(StoreError::Conflict(format!(
                "order {id} is {}, expected {from}",
                order.status
            )));
        }
        order.status = to;
        Ok(order.clone())
    }

    async fn shipment_for_order(&self, order: OrderId) -> Result<Option<Shipment>> {
        Ok(self.state.read().await.shipments.get(&order).cloned())
    }

    async fn update_shipment(
        &self,
        order: OrderId,
        from: ShipmentStatus,
        to: ShipmentStatus,
        current_location: Option<String>,
        notes: Option<String>,
    ) -> Result<Shipment> {
        let mut state = self.state.write().await;
        let shipment = state
            .shipments
            .get_mut(&order)
            .ok_or(StoreError::ShipmentNotFound(order))?;
        if shipment.status != from {
            return Err(StoreError::Conflict(format!(
                "shipment for order {order} is {}, expected {from}",
                shipment.status
            )));
        }
        shipment.status = to;
        if let Some(location) = current_location {
            shipment.current_location = Some(location);
        }
        if let Some(notes) = notes {
            shipment.notes = Some(notes);
        }
        if to == ShipmentStatus::Delivered {
            shipment.actual_delivery = Some(Utc::now());
        }
        Ok(shipment.clone())
    }
}
