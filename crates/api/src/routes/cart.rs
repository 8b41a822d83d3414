//! Cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use serde::{Deserialize, Serialize};
use store::{CartLine, Store};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::identity::Identity;
use crate::routes::orders::AppState;

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct AddItemBody {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct SetQuantityBody {
    /// Zero or negative removes the line.
    pub quantity: i32,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartLineResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: u32,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct SetQuantityResponse {
    pub removed: bool,
    pub line: Option<CartLineResponse>,
}

#[derive(Serialize)]
pub struct RemovedResponse {
    pub removed: bool,
}

#[derive(Serialize)]
pub struct ClearedResponse {
    pub removed_lines: u64,
}

fn line_response(line: CartLine) -> CartLineResponse {
    let line_total = line.unit_price.multiply(line.quantity);
    CartLineResponse {
        product_id: line.product_id,
        product_name: line.product_name,
        unit_price_cents: line.unit_price.cents(),
        quantity: line.quantity,
        line_total_cents: line_total.cents(),
    }
}

// -- Handlers --

/// GET /cart — the caller's cart, ordered by product name.
#[tracing::instrument(skip(state), fields(user = %identity.user_id))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<CartLineResponse>>, ApiError> {
    let lines = state.cart.lines(identity.user_id).await?;
    Ok(Json(lines.into_iter().map(line_response).collect()))
}

/// POST /cart/items — add to (or increment) a line.
#[tracing::instrument(skip(state, body), fields(user = %identity.user_id))]
pub async fn add_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(body): Json<AddItemBody>,
) -> Result<Json<CartLineResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let line = state
        .cart
        .add(
            identity.user_id,
            ProductId::from_uuid(body.product_id),
            body.quantity,
        )
        .await?;
    Ok(Json(line_response(line)))
}

/// PUT /cart/items/{product_id} — set an absolute quantity; zero removes.
#[tracing::instrument(skip(state, body), fields(user = %identity.user_id))]
pub async fn set_quantity<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(product_id): Path<Uuid>,
    Json(body): Json<SetQuantityBody>,
) -> Result<Json<SetQuantityResponse>, ApiError> {
    let line = state
        .cart
        .set_quantity(
            identity.user_id,
            ProductId::from_uuid(product_id),
            body.quantity,
        )
        .await?;
    Ok(Json(SetQuantityResponse {
        removed: line.is_none(),
        line: line.map(line_response),
    }))
}

/// DELETE /cart/items/{product_id} — remove one line.
#[tracing::instrument(skip(state), fields(user = %identity.user_id))]
pub async fn remove_item<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(product_id): Path<Uuid>,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed = state
        .cart
        .remove(identity.user_id, ProductId::from_uuid(product_id))
        .await?;
    Ok(Json(RemovedResponse { removed }))
}

/// DELETE /cart — empty the caller's cart.
#[tracing::instrument(skip(state), fields(user = %identity.user_id))]
pub async fn clear<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<ClearedResponse>, ApiError> {
    let removed_lines = state.cart.clear(identity.user_id).await?;
    Ok(Json(ClearedResponse { removed_lines }))
}
