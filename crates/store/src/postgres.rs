//! PostgreSQL-backed store implementation.
//!
//! The order-commit path runs in one transaction: product rows are locked
//! with `SELECT ... FOR UPDATE` in sorted-id order (so two concurrent
//! commits touching the same products cannot deadlock), stock is re-checked
//! under the lock, and every write of the placement happens inside the
//! [`PostgresStore::with_transaction`] scope. sqlx rolls the transaction
//! back when it is dropped without a commit, so any early `?` return
//! releases the unit cleanly.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use common::{
    Actor, InventoryTxKind, Money, OrderId, OrderStatus, ProductId, ShipmentId, ShipmentStatus,
    UserId,
};
use futures_util::future::BoxFuture;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

use crate::entities::{
    CartLine, CommittedOrder, InventoryTransaction, OrderDraft, OrderHistory, OrderLineItem,
    OrderRecord, Product, Shipment, StockChange, UserProfile,
};
use crate::store::{ESTIMATED_DELIVERY_DAYS, Store};
use crate::{Result, StoreError};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Runs `f` inside a single database transaction.
    ///
    /// Commits only if `f` succeeds; a dropped transaction rolls back, so
    /// every error path releases the unit without partial writes.
    async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T>> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let value = f(&mut *tx).await?;
        tx.commit().await.map_err(map_db_error)?;
        Ok(value)
    }
}

fn row_to_product(row: &PgRow) -> Result<Product> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        sku: row.try_get("sku")?,
        price: Money::from_cents(row.try_get("price_cents")?),
        stock_quantity: row.try_get("stock_quantity")?,
        min_stock: row.try_get("min_stock")?,
        location: row.try_get("location")?,
    })
}

fn row_to_user(row: &PgRow) -> Result<UserProfile> {
    Ok(UserProfile {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: row.try_get::<String, _>("role")?.parse()?,
    })
}

fn row_to_order(row: &PgRow) -> Result<OrderRecord> {
    Ok(OrderRecord {
        id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        total_amount: Money::from_cents(row.try_get("total_cents")?),
        status: row.try_get::<String, _>("status")?.parse()?,
        tracking_number: row.try_get("tracking_number")?,
        shipping_address: row.try_get("shipping_address")?,
        fraud_risk: row.try_get::<String, _>("fraud_risk")?.parse()?,
        fraud_reasons: row.try_get("fraud_reasons")?,
        order_date: row.try_get("order_date")?,
    })
}

fn row_to_line_item(row: &PgRow) -> Result<OrderLineItem> {
    Ok(OrderLineItem {
        id: row.try_get("id")?,
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("product_name")?,
        quantity: row.try_get::<i32, _>("quantity")? as u32,
        unit_price_at_purchase: Money::from_cents(row.try_get("unit_price_cents")?),
    })
}

fn row_to_shipment(row: &PgRow) -> Result<Shipment> {
    Ok(Shipment {
        id: ShipmentId::from_uuid(row.try_get::<Uuid, _>("id")?),
        order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
        tracking_number: row.try_get("tracking_number")?,
        status: row.try_get::<String, _>("status")?.parse()?,
        current_location: row.try_get("current_location")?,
        estimated_delivery: row.try_get("estimated_delivery")?,
        actual_delivery: row.try_get("actual_delivery")?,
        notes: row.try_get("notes")?,
    })
}

fn row_to_transaction(row: &PgRow) -> Result<InventoryTransaction> {
    Ok(InventoryTransaction {
        id: row.try_get("id")?,
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        kind: row.try_get::<String, _>("kind")?.parse()?,
        quantity_delta: row.try_get("quantity_delta")?,
        previous_quantity: row.try_get("previous_quantity")?,
        new_quantity: row.try_get("new_quantity")?,
        reason: row.try_get("reason")?,
        created_by: Actor::from_audit_string(row.try_get::<String, _>("created_by")?.as_str())?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_cart_line(row: &PgRow) -> Result<CartLine> {
    Ok(CartLine {
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
        product_name: row.try_get("name")?,
        unit_price: Money::from_cents(row.try_get("price_cents")?),
        quantity: row.try_get::<i32, _>("quantity")? as u32,
    })
}

/// Maps serialization failures and the tracking-number unique violation to
/// [`StoreError::Conflict`]; everything else stays a database error.
fn map_db_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.constraint() == Some("orders_tracking_number_key") {
            return StoreError::Conflict("tracking number already exists".to_string());
        }
        // 40001 = serialization_failure, 40P01 = deadlock_detected
        if let Some(code) = db_err.code()
            && (code == "40001" || code == "40P01")
        {
            return StoreError::Conflict(format!("serialization failure ({code})"));
        }
    }
    StoreError::Database(e)
}

const PRODUCT_COLUMNS: &str = "id, name, sku, price_cents, stock_quantity, min_stock, location";

#[async_trait]
impl Store for PostgresStore {
    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, name, email, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn insert_user(&self, user: UserProfile) -> Result<()> {
        sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
            .bind(user.id.as_uuid())
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.role.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, sku, price_cents, stock_quantity, min_stock, location)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                sku = EXCLUDED.sku,
                price_cents = EXCLUDED.price_cents,
                stock_quantity = EXCLUDED.stock_quantity,
                min_stock = EXCLUDED.min_stock,
                location = EXCLUDED.location
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.sku)
        .bind(product.price.cents())
        .bind(product.stock_quantity)
        .bind(product.min_stock)
        .bind(&product.location)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, reason))]
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
        let reason = reason.to_string();

        self.with_transaction(move |conn| {
            Box::pin(async move {
                let row = sqlx::query(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
                ))
                .bind(id.as_uuid())
                .fetch_optional(&mut *conn)
                .await?;
                let mut product = row
                    .as_ref()
                    .map(row_to_product)
                    .transpose()?
                    .ok_or(StoreError::ProductNotFound(id))?;

                let previous = product.stock_quantity;
                sqlx::query("UPDATE products SET stock_quantity = $1 WHERE id = $2")
                    .bind(new_quantity)
                    .bind(id.as_uuid())
                    .execute(&mut *conn)
                    .await?;
                product.stock_quantity = new_quantity;

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
                    reason,
                    created_by: actor,
                    created_at: Utc::now(),
                };
                insert_inventory_transaction(conn, &transaction).await?;

                Ok(StockChange {
                    product,
                    transaction,
                })
            })
        })
        .await
    }

    async fn transactions_for_product(
        &self,
        id: ProductId,
    ) -> Result<Vec<InventoryTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, kind, quantity_delta, previous_quantity, new_quantity,
                   reason, created_by, created_at
            FROM inventory_transactions
            WHERE product_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_transaction).collect()
    }

    async fn cart_lines(&self, user: UserId) -> Result<Vec<CartLine>> {
        let rows = sqlx::query(
            r#"
            SELECT c.user_id, c.product_id, c.quantity, p.name, p.price_cents
            FROM cart_lines c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY p.name
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_cart_line).collect()
    }

    async fn get_cart_line(&self, user: UserId, product: ProductId) -> Result<Option<CartLine>> {
        let row = sqlx::query(
            r#"
            SELECT c.user_id, c.product_id, c.quantity, p.name, p.price_cents
            FROM cart_lines c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1 AND c.product_id = $2
            "#,
        )
        .bind(user.as_uuid())
        .bind(product.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_cart_line).transpose()
    }

    async fn upsert_cart_line(
        &self,
        user: UserId,
        product: ProductId,
        quantity: u32,
    ) -> Result<CartLine> {
        sqlx::query(
            r#"
            INSERT INTO cart_lines (user_id, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(user.as_uuid())
        .bind(product.as_uuid())
        .bind(quantity as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("cart_lines_product_id_fkey")
            {
                return StoreError::ProductNotFound(product);
            }
            StoreError::Database(e)
        })?;

        self.get_cart_line(user, product)
            .await?
            .ok_or(StoreError::ProductNotFound(product))
    }

    async fn delete_cart_line(&self, user: UserId, product: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1 AND product_id = $2")
            .bind(user.as_uuid())
            .bind(product.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn order_history(&self, user: UserId) -> Result<OrderHistory> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n, COALESCE(SUM(total_cents), 0) AS spent FROM orders WHERE user_id = $1",
        )
        .bind(user.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(OrderHistory {
            total_orders: row.try_get("n")?,
            total_spent: Money::from_cents(row.try_get("spent")?),
        })
    }

    #[tracing::instrument(skip(self, draft), fields(order_id = %draft.order_id))]
    async fn commit_order(&self, draft: OrderDraft) -> Result<CommittedOrder> {
        let started = std::time::Instant::now();

        let committed = self
            .with_transaction(move |conn| {
                Box::pin(async move {
                    // Lock product rows in sorted-id order so concurrent
                    // commits acquire locks in the same sequence.
                    let mut lock_order: Vec<ProductId> =
                        draft.lines.iter().map(|l| l.product_id).collect();
                    lock_order.sort_unstable();
                    lock_order.dedup();

                    let mut stock: HashMap<ProductId, Product> = HashMap::new();
                    for product_id in &lock_order {
                        let row = sqlx::query(&format!(
                            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
                        ))
                        .bind(product_id.as_uuid())
                        .fetch_optional(&mut *conn)
                        .await?;
                        let product = row
                            .as_ref()
                            .map(row_to_product)
                            .transpose()?
                            .ok_or(StoreError::ProductNotFound(*product_id))?;
                        stock.insert(*product_id, product);
                    }

                    for line in &draft.lines {
                        let product = stock
                            .get(&line.product_id)
                            .ok_or(StoreError::ProductNotFound(line.product_id))?;
                        if product.stock_quantity < line.quantity as i32 {
                            return Err(StoreError::InsufficientStock {
                                product_id: product.id,
                                name: product.name.clone(),
                                requested: line.quantity,
                                available: product.stock_quantity,
                            });
                        }
                    }

                    let now = Utc::now();
                    sqlx::query(
                        r#"
                        INSERT INTO orders
                            (id, user_id, total_cents, status, tracking_number,
                             shipping_address, fraud_risk, fraud_reasons, order_date)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                        "#,
                    )
                    .bind(draft.order_id.as_uuid())
                    .bind(draft.user_id.as_uuid())
                    .bind(draft.total_amount.cents())
                    .bind(OrderStatus::Pending.as_str())
                    .bind(&draft.tracking_number)
                    .bind(&draft.shipping_address)
                    .bind(draft.fraud_risk.as_str())
                    .bind(&draft.fraud_reasons)
                    .bind(now)
                    .execute(&mut *conn)
                    .await
                    .map_err(map_db_error)?;

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
                        sqlx::query(
                            r#"
                            INSERT INTO order_line_items
                                (id, order_id, product_id, product_name, quantity, unit_price_cents)
                            VALUES ($1, $2, $3, $4, $5, $6)
                            "#,
                        )
                        .bind(item.id)
                        .bind(item.order_id.as_uuid())
                        .bind(item.product_id.as_uuid())
                        .bind(&item.product_name)
                        .bind(item.quantity as i32)
                        .bind(item.unit_price_at_purchase.cents())
                        .execute(&mut *conn)
                        .await?;
                        line_items.push(item);

                        let product = stock
                            .get_mut(&line.product_id)
                            .ok_or(StoreError::ProductNotFound(line.product_id))?;
                        let previous = product.stock_quantity;
                        let result = sqlx::query(
                            r#"
                            UPDATE products
                            SET stock_quantity = stock_quantity - $1
                            WHERE id = $2 AND stock_quantity >= $1
                            "#,
                        )
                        .bind(line.quantity as i32)
                        .bind(line.product_id.as_uuid())
                        .execute(&mut *conn)
                        .await?;
                        if result.rows_affected() == 0 {
                            // Only reachable when one order lists the same
                            // product twice and the second line drains it.
                            return Err(StoreError::InsufficientStock {
                                product_id: product.id,
                                name: product.name.clone(),
                                requested: line.quantity,
                                available: previous,
                            });
                        }
                        product.stock_quantity = previous - line.quantity as i32;
                        products.push(product.clone());

                        let transaction = InventoryTransaction {
                            id: Uuid::new_v4(),
                            product_id: line.product_id,
                            kind: InventoryTxKind::Sale,
                            quantity_delta: -(line.quantity as i32),
                            previous_quantity: previous,
                            new_quantity: product.stock_quantity,
                            reason: format!("sale for order {}", draft.order_id),
                            created_by: Actor::User(draft.user_id),
                            created_at: now,
                        };
                        insert_inventory_transaction(&mut *conn, &transaction).await?;
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
                    sqlx::query(
                        r#"
                        INSERT INTO shipments
                            (id, order_id, tracking_number, status, current_location,
                             estimated_delivery, actual_delivery, notes)
                        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                        "#,
                    )
                    .bind(shipment.id.as_uuid())
                    .bind(shipment.order_id.as_uuid())
                    .bind(&shipment.tracking_number)
                    .bind(shipment.status.as_str())
                    .bind(&shipment.current_location)
                    .bind(shipment.estimated_delivery)
                    .bind(shipment.actual_delivery)
                    .bind(&shipment.notes)
                    .execute(&mut *conn)
                    .await?;

                    // Cart clear is part of the same atomic unit: commit and
                    // clear cannot diverge.
                    sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
                        .bind(draft.user_id.as_uuid())
                        .execute(&mut *conn)
                        .await?;

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

                    Ok(CommittedOrder {
                        order,
                        line_items,
                        shipment,
                        products,
                    })
                })
            })
            .await?;

        metrics::histogram!("store_commit_order_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(committed)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<OrderRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, tracking_number, shipping_address,
                   fraud_risk, fraud_reasons, order_date
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn order_line_items(&self, id: OrderId) -> Result<Vec<OrderLineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, product_name, quantity, unit_price_cents
            FROM order_line_items
            WHERE order_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_line_item).collect()
    }

    async fn orders_for_user(&self, user: UserId) -> Result<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, total_cents, status, tracking_number, shipping_address,
                   fraud_risk, fraud_reasons, order_date
            FROM orders
            WHERE user_id = $1
            ORDER BY order_date DESC
            "#,
        )
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_order).collect()
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderRecord> {
        let row = sqlx::query(
            r#"
            UPDATE orders SET status = $1
            WHERE id = $2 AND status = $3
            RETURNING id, user_id, total_cents, status, tracking_number, shipping_address,
                      fraud_risk, fraud_reasons, order_date
            "#,
        )
        .bind(to.as_str())
        .bind(id.as_uuid())
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_order(&row),
            None => match self.get_order(id).await? {
                Some(order) => Err(StoreError::Conflict(format!(
                    "order {id} is {}, expected {from}",
                    order.status
                ))),
                None => Err(StoreError::OrderNotFound(id)),
            },
        }
    }

    async fn shipment_for_order(&self, order: OrderId) -> Result<Option<Shipment>> {
        let row = sqlx::query(
            r#"
            SELECT id, order_id, tracking_number, status, current_location,
                   estimated_delivery, actual_delivery, notes
            FROM shipments
            WHERE order_id = $1
            "#,
        )
        .bind(order.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_shipment).transpose()
    }

    async fn update_shipment(
        &self,
        order: OrderId,
        from: ShipmentStatus,
        to: ShipmentStatus,
        current_location: Option<String>,
        notes: Option<String>,
    ) -> Result<Shipment> {
        let actual_delivery: Option<DateTime<Utc>> =
            (to == ShipmentStatus::Delivered).then(Utc::now);

        let row = sqlx::query(
            r#"
            UPDATE shipments
            SET status = $1,
                current_location = COALESCE($2, current_location),
                notes = COALESCE($3, notes),
                actual_delivery = COALESCE($4, actual_delivery)
            WHERE order_id = $5 AND status = $6
            RETURNING id, order_id, tracking_number, status, current_location,
                      estimated_delivery, actual_delivery, notes
            "#,
        )
        .bind(to.as_str())
        .bind(current_location)
        .bind(notes)
        .bind(actual_delivery)
        .bind(order.as_uuid())
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => row_to_shipment(&row),
            None => match self.shipment_for_order(order).await? {
                Some(shipment) => Err(StoreError::Conflict(format!(
                    "shipment for order {order} is {}, expected {from}",
                    shipment.status
                ))),
                None => Err(StoreError::ShipmentNotFound(order)),
            },
        }
    }
}

async fn insert_inventory_transaction(
    conn: &mut PgConnection,
    transaction: &InventoryTransaction,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions
            (id, product_id, kind, quantity_delta, previous_quantity, new_quantity,
             reason, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.product_id.as_uuid())
    .bind(transaction.kind.as_str())
    .bind(transaction.quantity_delta)
    .bind(transaction.previous_quantity)
    .bind(transaction.new_quantity)
    .bind(&transaction.reason)
    .bind(transaction.created_by.as_audit_string())
    .bind(transaction.created_at)
    .execute(conn)
    .await?;
    Ok(())
}
