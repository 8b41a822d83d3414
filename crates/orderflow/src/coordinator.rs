//! The order transaction coordinator.
//!
//! Drives one placement end to end: validate the request, snapshot prices
//! from the catalog, score fraud risk against the user's history, then hand
//! the assembled draft to the store for a single atomic commit. Events are
//! broadcast only after the commit returns; a broadcast problem never rolls
//! back a committed order.

use common::{Money, OrderId, ProductId, Role, UserId};
use domain::fraud;
use realtime::{Audience, Broadcaster, OrderNotice, ServerEvent};
use store::{CommittedOrder, DraftLine, OrderDraft, OrderLineItem, OrderRecord, Shipment, Store, UserProfile};

use crate::error::{OrderFlowError, Result};

/// One requested order line.
#[derive(Debug, Clone, Copy)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A validated place-order request.
#[derive(Debug, Clone)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItemRequest>,
    pub shipping_address: String,
}

/// The outcome of a successful placement.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub order: OrderRecord,
    pub line_items: Vec<OrderLineItem>,
    pub shipment: Shipment,
}

/// Coordinates order placement across the store, the fraud evaluator, and
/// the broadcaster.
pub struct OrderCoordinator<S: Store> {
    store: S,
    broadcaster: Broadcaster,
}

impl<S: Store> OrderCoordinator<S> {
    /// Creates a new coordinator.
    pub fn new(store: S, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Places an order for `user_id`.
    ///
    /// Either the whole order commits - stock decremented, ledger rows
    /// appended, order, line items, and shipment inserted, cart cleared -
    /// or nothing is written and a typed error reports the first failing
    /// line.
    #[tracing::instrument(skip(self, request), fields(user = %user_id))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder> {
        metrics::counter!("orders_attempted_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.place_order_inner(user_id, request).await;
        match &result {
            Ok(placed) => {
                metrics::counter!("orders_placed_total").increment(1);
                metrics::histogram!("order_placement_seconds")
                    .record(started.elapsed().as_secs_f64());
                tracing::info!(
                    order = %placed.order.id,
                    tracking = %placed.order.tracking_number,
                    total = %placed.order.total_amount,
                    risk = %placed.order.fraud_risk,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::info!(error = %e, "order rejected");
            }
        }
        result
    }

    async fn place_order_inner(
        &self,
        user_id: UserId,
        request: PlaceOrderRequest,
    ) -> Result<PlacedOrder> {
        validate_request(&request)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| OrderFlowError::Validation(format!("unknown user {user_id}")))?;

        // Snapshot prices and names from the live catalog. The stock check
        // here fails fast before anything is written; the store re-checks
        // under the transaction's lock.
        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = self
                .store
                .get_product(item.product_id)
                .await?
                .ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            if product.stock_quantity < item.quantity as i32 {
                return Err(OrderFlowError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    requested: item.quantity,
                    available: product.stock_quantity,
                });
            }
            lines.push(DraftLine {
                product_id: product.id,
                product_name: product.name,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }

        let total_amount: Money = lines
            .iter()
            .map(|l| l.unit_price.multiply(l.quantity))
            .sum();

        let history = self.store.order_history(user_id).await?;
        let verdict = fraud::evaluate(
            &fraud::OrderProfile {
                total: Some(total_amount),
                lines: lines
                    .iter()
                    .map(|l| fraud::LineProfile {
                        product_name: l.product_name.clone(),
                        quantity: l.quantity,
                        unit_price: l.unit_price,
                    })
                    .collect(),
                shipping_address: request.shipping_address.clone(),
            },
            &fraud::HistorySnapshot {
                total_orders: history.total_orders,
                total_spent: history.total_spent,
            },
        );

        let draft = OrderDraft {
            order_id: OrderId::new(),
            user_id,
            lines,
            total_amount,
            shipping_address: request.shipping_address,
            fraud_risk: verdict.risk,
            fraud_reasons: verdict.reasons,
            tracking_number: domain::generate_tracking_number(),
        };

        let committed = self.store.commit_order(draft).await?;
        self.broadcast_placement(&committed, &user);

        Ok(PlacedOrder {
            order: committed.order,
            line_items: committed.line_items,
            shipment: committed.shipment,
        })
    }

    /// Emits the post-commit events: every affected product snapshot, then
    /// the created order, then the cart invalidation for the owner.
    fn broadcast_placement(&self, committed: &CommittedOrder, user: &UserProfile) {
        for product in &committed.products {
            self.broadcaster.publish(
                Audience::All,
                &ServerEvent::InventoryChanged {
                    product: product.clone(),
                },
            );
        }

        self.broadcaster.publish(
            Audience::UserOrRole(user.id, Role::Admin),
            &ServerEvent::OrderCreated {
                order: OrderNotice {
                    order: committed.order.clone(),
                    customer_name: user.name.clone(),
                    customer_email: user.email.clone(),
                },
            },
        );

        self.broadcaster
            .publish(Audience::User(user.id), &ServerEvent::CartUpdated { user_id: user.id });
    }
}

fn validate_request(request: &PlaceOrderRequest) -> Result<()> {
    if request.items.is_empty() {
        return Err(OrderFlowError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    if request.shipping_address.trim().is_empty() {
        return Err(OrderFlowError::Validation(
            "shipping address is required".to_string(),
        ));
    }
    for item in &request.items {
        if item.quantity == 0 {
            return Err(OrderFlowError::Validation(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }
    }
    let mut seen = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if seen.contains(&item.product_id) {
            return Err(OrderFlowError::Validation(format!(
                "product {} appears in more than one line",
                item.product_id
            )));
        }
        seen.push(item.product_id);
    }
    Ok(())
}
