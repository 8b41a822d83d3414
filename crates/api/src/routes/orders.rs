//! Order placement, reads, and admin lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{FraudRisk, OrderId, OrderStatus, ProductId, ShipmentId, ShipmentStatus};
use orderflow::{
    CartService, InventoryService, OrderAdminService, OrderCoordinator, OrderItemRequest,
    PlaceOrderRequest,
};
use realtime::SessionRegistry;
use serde::{Deserialize, Serialize};
use store::{OrderLineItem, OrderRecord, Shipment, Store};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::identity::Identity;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub store: S,
    pub coordinator: OrderCoordinator<S>,
    pub cart: CartService<S>,
    pub inventory: InventoryService<S>,
    pub admin: OrderAdminService<S>,
    pub registry: Arc<SessionRegistry>,
}

// -- Request types --

#[derive(Deserialize, Validate)]
pub struct PlaceOrderBody {
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItemBody>,
    #[validate(length(min = 1, message = "shipping address is required"))]
    pub shipping_address: String,
}

#[derive(Deserialize, Serialize, Validate)]
pub struct OrderItemBody {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: u32,
}

#[derive(Deserialize)]
pub struct UpdateOrderStatusBody {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct UpdateShipmentBody {
    pub status: ShipmentStatus,
    pub current_location: Option<String>,
    pub notes: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct PlacedOrderResponse {
    pub order_id: OrderId,
    pub tracking_number: String,
    pub total_cents: i64,
    pub fraud_risk: FraudRisk,
    pub fraud_reasons: Vec<String>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
}

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub tracking_number: String,
    pub shipping_address: String,
    pub fraud_risk: FraudRisk,
    pub fraud_reasons: Vec<String>,
    pub order_date: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct ShipmentResponse {
    pub id: ShipmentId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub status: ShipmentStatus,
    pub current_location: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub actual_delivery: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

fn order_response(order: OrderRecord, items: Vec<OrderLineItem>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        status: order.status,
        total_cents: order.total_amount.cents(),
        tracking_number: order.tracking_number,
        shipping_address: order.shipping_address,
        fraud_risk: order.fraud_risk,
        fraud_reasons: order.fraud_reasons,
        order_date: order.order_date,
        items: items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price_cents: item.unit_price_at_purchase.cents(),
            })
            .collect(),
    }
}

fn shipment_response(shipment: Shipment) -> ShipmentResponse {
    ShipmentResponse {
        id: shipment.id,
        order_id: shipment.order_id,
        tracking_number: shipment.tracking_number,
        status: shipment.status,
        current_location: shipment.current_location,
        estimated_delivery: shipment.estimated_delivery,
        actual_delivery: shipment.actual_delivery,
        notes: shipment.notes,
    }
}

// -- Handlers --

/// POST /orders — place an order from explicit line items.
#[tracing::instrument(skip(state, body), fields(user = %identity.user_id))]
pub async fn place<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Json(body): Json<PlaceOrderBody>,
) -> Result<(StatusCode, Json<PlacedOrderResponse>), ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let request = PlaceOrderRequest {
        items: body
            .items
            .iter()
            .map(|item| OrderItemRequest {
                product_id: ProductId::from_uuid(item.product_id),
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: body.shipping_address,
    };

    let placed = state.coordinator.place_order(identity.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(PlacedOrderResponse {
            order_id: placed.order.id,
            tracking_number: placed.order.tracking_number,
            total_cents: placed.order.total_amount.cents(),
            fraud_risk: placed.order.fraud_risk,
            fraud_reasons: placed.order.fraud_reasons,
        }),
    ))
}

/// GET /orders — the caller's orders, newest first.
#[tracing::instrument(skip(state), fields(user = %identity.user_id))]
pub async fn list<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let orders = state.store.orders_for_user(identity.user_id).await?;
    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
        let items = state.store.order_line_items(order.id).await?;
        responses.push(order_response(order, items));
    }
    Ok(Json(responses))
}

/// GET /orders/{id} — one order, visible to its owner and to admins.
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let order = state
        .store
        .get_order(order_id)
        .await?
        .filter(|o| identity.can_access(o.user_id))
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;

    let items = state.store.order_line_items(order_id).await?;
    Ok(Json(order_response(order, items)))
}

/// PUT /orders/{id}/status — admin lifecycle transition.
#[tracing::instrument(skip(state, body))]
pub async fn update_status<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusBody>,
) -> Result<Json<OrderResponse>, ApiError> {
    identity.require_admin()?;

    let order_id = OrderId::from_uuid(id);
    let updated = state.admin.update_order_status(order_id, body.status).await?;
    let items = state.store.order_line_items(order_id).await?;
    Ok(Json(order_response(updated, items)))
}

/// GET /orders/{id}/shipment — tracking view for the owner and admins.
#[tracing::instrument(skip(state))]
pub async fn get_shipment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    let order_id = OrderId::from_uuid(id);
    let order = state
        .store
        .get_order(order_id)
        .await?
        .filter(|o| identity.can_access(o.user_id))
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;

    let shipment = state
        .store
        .shipment_for_order(order.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no shipment for order {order_id}")))?;
    Ok(Json(shipment_response(shipment)))
}

/// PUT /orders/{id}/shipment/status — admin shipment transition.
#[tracing::instrument(skip(state, body))]
pub async fn update_shipment<S: Store + 'static>(
    State(state): State<Arc<AppState<S>>>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateShipmentBody>,
) -> Result<Json<ShipmentResponse>, ApiError> {
    identity.require_admin()?;

    let order_id = OrderId::from_uuid(id);
    let updated = state
        .admin
        .update_shipment_status(order_id, body.status, body.current_location, body.notes)
        .await?;
    Ok(Json(shipment_response(updated)))
}
