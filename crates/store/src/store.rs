//! The storage trait implemented by the in-memory and PostgreSQL backends.

use async_trait::async_trait;
use common::{Actor, OrderId, OrderStatus, ProductId, ShipmentStatus, UserId};

use crate::Result;
use crate::entities::{
    CartLine, CommittedOrder, InventoryTransaction, OrderDraft, OrderHistory, OrderLineItem,
    OrderRecord, Product, Shipment, StockChange, UserProfile,
};

/// Days after commit used for a new shipment's estimated delivery date.
pub const ESTIMATED_DELIVERY_DAYS: i64 = 5;

/// Transactional storage for products, carts, orders, and shipments.
///
/// Every implementation must make [`Store::commit_order`] a single atomic
/// unit: the stock re-check, decrements, ledger rows, order, line items,
/// shipment, and cart clear all commit together or not at all, and two
/// concurrent commits can never drive a product's stock below zero.
#[async_trait]
pub trait Store: Send + Sync {
    // -- users --

    /// Loads a user's display and identity fields.
    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>>;

    /// Inserts a user row. Used by provisioning and tests; identity
    /// management itself lives outside this system.
    async fn insert_user(&self, user: UserProfile) -> Result<()>;

    // -- products and the inventory ledger --

    /// Loads a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Lists the whole catalog, ordered by name.
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Inserts a product row. Catalog CRUD is out of scope; this exists for
    /// provisioning and tests.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Sets a product's stock to `new_quantity` and appends a `restock` or
    /// `adjustment` ledger row depending on the delta's sign.
    ///
    /// Rejects negative targets. A zero-delta adjustment still appends a
    /// ledger row so the audit trail records the attempt.
    async fn adjust_stock(
        &self,
        id: ProductId,
        new_quantity: i32,
        reason: &str,
        actor: Actor,
    ) -> Result<StockChange>;

    /// Returns the ledger rows for a product, newest first.
    async fn transactions_for_product(&self, id: ProductId)
    -> Result<Vec<InventoryTransaction>>;

    // -- cart --

    /// Returns a user's cart lines ordered by product name.
    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>>;

    /// Returns one cart line, if present.
    async fn get_cart_line(&self, user: UserId, product: ProductId) -> Result<Option<CartLine>>;

    /// Creates or replaces the line for `(user, product)` with `quantity`.
    /// Quantity validation against stock belongs to the cart service.
    async fn upsert_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<CartLine>;

    /// Deletes one cart line. Returns true if a line existed.
    async fn delete_cart_line(&self, user: UserId, product: ProductId) -> Result<bool>;

    /// Deletes all of a user's cart lines. Returns the number removed.
    async fn clear_cart(&self, user: UserId) -> Result<u64>;

    // -- orders and shipments --

    /// Computes the count and total spend of a user's prior orders.
    async fn order_history(&self, user: UserId) -> Result<OrderHistory>;

    /// Atomically commits a placed order: re-checks stock for every line,
    /// decrements it, appends one `sale` ledger row per line, inserts the
    /// order, its line items, and a `pending` shipment, and clears the
    /// user's cart.
    ///
    /// Fails with [`StoreError::InsufficientStock`] or
    /// [`StoreError::ProductNotFound`] without writing anything if any line
    /// cannot be satisfied; fails with [`StoreError::Conflict`] when a
    /// concurrent commit wins a serialization race.
    ///
    /// [`StoreError::InsufficientStock`]: crate::StoreError::InsufficientStock
    /// [`StoreError::ProductNotFound`]: crate::StoreError::ProductNotFound
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    async fn commit_order(&self, draft: OrderDraft) -> Result<CommittedOrder>;

    /// Loads an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>>;

    /// Returns the line items of an order in insertion order.
    async fn order_line_items(&self, id: OrderId) -> Result<Vec<OrderLineItem>>;

    /// Returns a user's orders, newest first.
    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>>;

    /// Moves an order from `from` to `to`, failing with
    /// [`StoreError::Conflict`] if the stored status is no longer `from`.
    ///
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderRecord>;

    /// Loads the shipment belonging to an order.
    async fn shipment_for_order(&self, order: OrderId) -> Result<Option<Shipment>>;

    /// Moves a shipment from `from` to `to`, optionally updating location
    /// and notes; stamps `actual_delivery` when `to` is `Delivered`. Fails
    /// with [`StoreError::Conflict`] if the stored status is no longer
    /// `from`.
    ///
    /// [`StoreError::Conflict`]: crate::StoreError::Conflict
    async fn update_shipment(
        &self,
        order: OrderId,
        from: ShipmentStatus,
        to: ShipmentStatus,
        current_location: Option<String>,
        notes: Option<String>,
    ) -> Result<Shipment>;
}
