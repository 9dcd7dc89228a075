//! Cart endpoints.
//!
//! Every handler answers with the full cart so clients never recompute totals.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use common::ProductId;
use domain::{Cart, CartItem, Money};
use serde::{Deserialize, Serialize};
use store::{CheckoutStore, ProductCatalog};

use super::AppState;
use crate::error::ApiError;
use crate::identity::RequestIdentity;

// -- Request types --

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

// -- Response types --

#[derive(Serialize)]
pub struct CartResponse {
    pub id: Option<String>,
    pub owner: &'static str,
    pub items: Vec<CartItemResponse>,
    pub total_price: Money,
    pub total_items: u64,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub id: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub image_url: Option<String>,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id().map(|id| id.to_string()),
            product_id: item.product_id().to_string(),
            product_name: item.product_name().to_string(),
            image_url: item.image_url().map(str::to_string),
            unit_price: item.unit_price(),
            quantity: item.quantity(),
            line_total: item.line_total(),
        }
    }
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id().map(|id| id.to_string()),
            owner: cart.owner().kind(),
            items: cart.items().map(CartItemResponse::from).collect(),
            total_price: cart.total_price(),
            total_items: cart.total_items(),
        }
    }
}

fn parse_quantity(quantity: i64) -> Result<u32, ApiError> {
    u32::try_from(quantity)
        .map_err(|_| ApiError::BadRequest(format!("Invalid quantity: {quantity}")))
}

// -- Handlers --

/// GET /api/cart — the caller's cart, created on first access.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.carts.get_cart(identity.evidence()).await?;
    Ok((
        identity.set_cookie(state.guest_cookie_max_age_secs),
        Json(CartResponse::from(&cart)),
    ))
}

/// DELETE /api/cart — remove every line.
#[tracing::instrument(skip(state))]
pub async fn clear<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.carts.clear(identity.evidence()).await?;
    Ok((
        identity.set_cookie(state.guest_cookie_max_age_secs),
        Json(CartResponse::from(&cart)),
    ))
}

/// POST /api/cart/items — add units of a product.
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
    Json(req): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = parse_quantity(req.quantity)?;
    let product_id = ProductId::new(req.product_id);

    let cart = state
        .carts
        .add_item(identity.evidence(), &product_id, quantity)
        .await?;
    Ok((
        identity.set_cookie(state.guest_cookie_max_age_secs),
        Json(CartResponse::from(&cart)),
    ))
}

/// PUT /api/cart/items/:product_id — set a line's quantity; zero removes it.
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
    Path(product_id): Path<String>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = parse_quantity(req.quantity)?;

    let cart = state
        .carts
        .update_quantity(identity.evidence(), &ProductId::new(product_id), quantity)
        .await?;
    Ok((
        identity.set_cookie(state.guest_cookie_max_age_secs),
        Json(CartResponse::from(&cart)),
    ))
}

/// DELETE /api/cart/items/:product_id — remove a line.
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    identity: RequestIdentity,
    Path(product_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state
        .carts
        .remove_item(identity.evidence(), &ProductId::new(product_id))
        .await?;
    Ok((
        identity.set_cookie(state.guest_cookie_max_age_secs),
        Json(CartResponse::from(&cart)),
    ))
}
