//! Admin inventory adjustments.

use common::{Actor, ProductId};
use realtime::{Audience, Broadcaster, ServerEvent};
use store::{StockChange, Store};

use crate::error::{OrderFlowError, Result};

/// Restock and manual-correction operations on the inventory ledger.
///
/// Sale decrements are not performed here; they happen inside the order
/// commit so they share its transaction.
pub struct InventoryService<S: Store> {
    store: S,
    broadcaster: Broadcaster,
}

impl<S: Store> InventoryService<S> {
    /// Creates a new inventory service.
    pub fn new(store: S, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Sets a product's stock to an absolute quantity, appending the
    /// matching ledger row, and pushes the updated snapshot to all
    /// connected sessions.
    #[tracing::instrument(skip(self, reason))]
    pub async fn adjust_stock(
        &self,
        actor: Actor,
        product_id: ProductId,
        new_quantity: i32,
        reason: &str,
    ) -> Result<StockChange> {
        if new_quantity < 0 {
            return Err(OrderFlowError::Validation(format!(
                "stock cannot be negative: {new_quantity}"
            )));
        }
        if reason.trim().is_empty() {
            return Err(OrderFlowError::Validation(
                "a reason is required for stock adjustments".to_string(),
            ));
        }

        let change = self
            .store
            .adjust_stock(product_id, new_quantity, reason, actor)
            .await?;

        tracing::info!(
            product = %product_id,
            previous = change.transaction.previous_quantity,
            new = change.transaction.new_quantity,
            kind = %change.transaction.kind,
            "stock adjusted"
        );
        self.broadcaster.publish(
            Audience::All,
            &ServerEvent::InventoryChanged {
                product: change.product.clone(),
            },
        );

        Ok(change)
    }
}
