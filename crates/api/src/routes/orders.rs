//! Checkout and order history endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::OrderId;
use domain::{Money, Order};
use serde::Serialize;
use store::{CheckoutStore, ProductCatalog};

use super::AppState;
use crate::error::ApiError;
use crate::identity::RequestIdentity;

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: Option<String>,
    pub owner_id: String,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub total_amount: Money,
    pub items: Vec<OrderItemResponse>,
}

#[derive(Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id().map(|id| id.to_string()),
            owner_id: order.owner().to_string(),
            status: order.status().as_str(),
            created_at: order.created_at(),
            total_amount: order.total_amount(),
            items: order
                .items()
                .iter()
                .map(|item| OrderItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    line_total: item.line_total,
                })
                .collect(),
        }
    }
}

// -- Handlers --

/// POST /api/orders/checkout — turn the signed-in user's cart into an order.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let user = identity.require_user()?;
    let order = state.checkout.checkout(user).await?;
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// GET /api/orders — the signed-in user's orders, newest first.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let user = identity.require_user()?;
    let orders = state.checkout.list_orders(user).await?;
    Ok(Json(orders.iter().map(OrderResponse::from).collect()))
}

/// GET /api/orders/:id — one of the signed-in user's orders.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let user = identity.require_user()?;
    let order_id = parse_order_id(&id)?;
    let order = state.checkout.get_order(user, order_id).await?;
    Ok(Json(OrderResponse::from(&order)))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid ID format: {e}")))
}
