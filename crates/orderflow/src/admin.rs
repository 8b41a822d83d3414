//! Admin lifecycle transitions for orders and shipments.
//!
//! The coordinator creates both records in `pending`; everything after
//! that happens here, validated against the transition rules the enums
//! carry, and pushed to the owner's and administrators' sessions.

use common::{OrderId, OrderStatus, Role, ShipmentStatus};
use realtime::{Audience, Broadcaster, ServerEvent};
use store::{OrderRecord, Shipment, Store};

use crate::error::{OrderFlowError, Result};

/// Status transitions performed by administrators.
pub struct OrderAdminService<S: Store> {
    store: S,
    broadcaster: Broadcaster,
}

impl<S: Store> OrderAdminService<S> {
    /// Creates a new admin service.
    pub fn new(store: S, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Moves an order to `next`, if the transition is legal from its
    /// current status.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderRecord> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(next) {
            return Err(OrderFlowError::InvalidTransition {
                entity: "order",
                from: order.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = self
            .store
            .update_order_status(order_id, order.status, next)
            .await?;

        tracing::info!(order = %order_id, status = %next, "order status updated");
        self.broadcaster.publish(
            Audience::UserOrRole(updated.user_id, Role::Admin),
            &ServerEvent::OrderStatusChanged {
                order_id,
                status: next,
            },
        );

        Ok(updated)
    }

    /// Moves an order's shipment to `next`, optionally updating its
    /// location and notes.
    #[tracing::instrument(skip(self, current_location, notes))]
    pub async fn update_shipment_status(
        &self,
        order_id: OrderId,
        next: ShipmentStatus,
        current_location: Option<String>,
        notes: Option<String>,
    ) -> Result<Shipment> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let shipment = self
            .store
            .shipment_for_order(order_id)
            .await?
            .ok_or(OrderFlowError::ShipmentNotFound(order_id))?;

        if !shipment.status.can_transition_to(next) {
            return Err(OrderFlowError::InvalidTransition {
                entity: "shipment",
                from: shipment.status.to_string(),
                to: next.to_string(),
            });
        }

        let updated = self
            .store
            .update_shipment(order_id, shipment.status, next, current_location, notes)
            .await?;

        tracing::info!(order = %order_id, status = %next, "shipment updated");
        self.broadcaster.publish(
            Audience::UserOrRole(order.user_id, Role::Admin),
            &ServerEvent::ShipmentUpdated {
                shipment: updated.clone(),
            },
        );

        Ok(updated)
    }
}
