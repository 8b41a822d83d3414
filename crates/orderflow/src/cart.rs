//! Cart mutations with stock validation.
//!
//! Every mutation notifies the owner's sessions that the cart changed;
//! clients re-fetch rather than trusting a pushed cart payload.

use common::{ProductId, UserId};
use realtime::{Audience, Broadcaster, ServerEvent};
use store::{CartLine, Store};

use crate::error::{OrderFlowError, Result};

/// Validated cart operations for the cart UI.
pub struct CartService<S: Store> {
    store: S,
    broadcaster: Broadcaster,
}

impl<S: Store> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S, broadcaster: Broadcaster) -> Self {
        Self { store, broadcaster }
    }

    /// Returns the user's cart, ordered by product name.
    pub async fn lines(&self, user: UserId) -> Result<Vec<CartLine>> {
        Ok(self.store.cart_lines(user).await?)
    }

    /// Adds `quantity` of a product, merging with any existing line. The
    /// merged quantity must not exceed the live stock.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn add(&self, user: UserId, product_id: ProductId, quantity: u32) -> Result<CartLine> {
        if quantity == 0 {
            return Err(OrderFlowError::Validation(
                "quantity must be positive".to_string(),
            ));
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(OrderFlowError::ProductNotFound(product_id))?;

        let existing = self
            .store
            .get_cart_line(user, product_id)
            .await?
            .map(|l| l.quantity)
            .unwrap_or(0);
        let merged = existing + quantity;
        if merged as i32 > product.stock_quantity {
            return Err(OrderFlowError::InsufficientStock {
                product_id,
                name: product.name,
                requested: merged,
                available: product.stock_quantity,
            });
        }

        let line = self.store.upsert_cart_line(user, product_id, merged).await?;
        self.notify(user);
        Ok(line)
    }

    /// Sets a line to an absolute quantity. A non-positive quantity removes
    /// the line; that is a removal, not an error.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn set_quantity(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Option<CartLine>> {
        if quantity <= 0 {
            self.store.delete_cart_line(user, product_id).await?;
            self.notify(user);
            return Ok(None);
        }

        let product = self
            .store
            .get_product(product_id)
            .await?
            .ok_or(OrderFlowError::ProductNotFound(product_id))?;
        if quantity > product.stock_quantity {
            return Err(OrderFlowError::InsufficientStock {
                product_id,
                name: product.name,
                requested: quantity as u32,
                available: product.stock_quantity,
            });
        }

        let line = self
            .store
            .upsert_cart_line(user, product_id, quantity as u32)
            .await?;
        self.notify(user);
        Ok(Some(line))
    }

    /// Removes one line. Returns true if a line existed.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn remove(&self, user: UserId, product_id: ProductId) -> Result<bool> {
        let removed = self.store.delete_cart_line(user, product_id).await?;
        if removed {
            self.notify(user);
        }
        Ok(removed)
    }

    /// Empties the cart. Returns the number of lines removed.
    #[tracing::instrument(skip(self), fields(user = %user))]
    pub async fn clear(&self, user: UserId) -> Result<u64> {
        let removed = self.store.clear_cart(user).await?;
        if removed > 0 {
            self.notify(user);
        }
        Ok(removed)
    }

    fn notify(&self, user: UserId) {
        self.broadcaster
            .publish(Audience::User(user), &ServerEvent::CartUpdated { user_id: user });
    }
}
