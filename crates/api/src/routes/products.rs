//! Catalog reads and admin inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use common::{Actor, InventoryTxKind, ProductId};
use serde::{Deserialize, Serialize};
use store::{InventoryTransaction, Product, Store};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::routes::orders::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct AdjustStockBody {
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock_quantity: i32,
    #[validate(length(min = 1, message = "a reason is required"))]
    pub reason: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub price_cents: i64,
    pub stock_quantity: i32,
    pub min_stock: i32,
    pub location: String,
    pub low_stock: bool,
}

#[derive(Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub product_id: ProductId,
    pub kind: InventoryTxKind,
    pub quantity_delta: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub reason: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

fn product_response(product: Product) -> ProductResponse {
    let low_stock = product.is_low_stock();
    ProductResponse {
        id: product.id,
        name: product.name,
        sku: product.sku,
        price_cents: product.price.cents(),
        stock_quantity: product.stock_quantity,
        min_stock: product.min_stock,
        location: product.location,
        low_stock,
    }
}

fn transaction_response(tx: InventoryTransaction) -> TransactionResponse {
    TransactionResponse {
        id: tx.id,
        product_id: tx.product_id,
        kind: tx.kind,
        quantity_delta: tx.quantity_delta,
        previous_quantity: tx.previous_quantity,
        new_quantity: tx.new_quantity,
        reason: tx.reason,
        created_by: tx.created_by.as_audit_string(),
        created_at: tx.created_at,
    }
}

// -- Handlers --

/// GET /products — the catalog, ordered by name.
#[tracing::instrument(skip(state, _identity))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _identity: Identity,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.store.list_products().await?;
    Ok(Json(products.into_iter().map(product_response).collect()))
}

/// GET /products/{id} — one product.
#[tracing::instrument(skip(state, _identity))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    _identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product_id = ProductId::from_uuid(id);
    let product = state
        .store
        .get_product(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("product {product_id} not found")))?;
    Ok(Json(product_response(product)))
}

/// PUT /products/{id}/stock — admin restock / manual correction.
#[tracing::instrument(skip(state, body))]
pub async fn adjust_stock<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<AdjustStockBody>,
) -> Result<Json<ProductResponse>, ApiError> {
    identity.require_admin()?;
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let change = state
        .inventory
        .adjust_stock(
            Actor::User(identity.user_id),
            ProductId::from_uuid(id),
            body.stock_quantity,
            &body.reason,
        )
        .await?;
    Ok(Json(product_response(change.product)))
}

/// GET /products/{id}/transactions — admin audit trail, newest first.
#[tracing::instrument(skip(state))]
pub async fn transactions<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    identity.require_admin()?;

    let product_id = ProductId::from_uuid(id);
    if state.store.get_product(product_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "product {product_id} not found"
        )));
    }
    let rows = state.store.transactions_for_product(product_id).await?;
    Ok(Json(rows.into_iter().map(transaction_response).collect()))
}
