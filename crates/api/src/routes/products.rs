//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use checkout::ServiceError;
use common::ProductId;
use domain::{Money, Product};
use serde::Serialize;
use store::{CheckoutStore, ProductCatalog};

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: Money,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name,
            description: product.description,
            image_url: product.image_url,
            unit_price: product.unit_price,
        }
    }
}

/// GET /api/products — list the catalog.
#[tracing::instrument(skip(state))]
pub async fn list<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state
        .carts
        .catalog()
        .list_products()
        .await
        .map_err(ServiceError::Store)?;

    Ok(Json(products.into_iter().map(ProductResponse::from).collect()))
}

/// GET /api/products/:id — fetch one product.
#[tracing::instrument(skip(state))]
pub async fn get<S: CheckoutStore + 'static, C: ProductCatalog + 'static>(
    State(state): State<Arc<AppState<S, C>>>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    let product = state
        .carts
        .catalog()
        .get_product(&ProductId::new(id.as_str()))
        .await
        .map_err(ServiceError::Store)?
        .ok_or_else(|| ApiError::NotFound(format!("Product {id} not found")))?;

    Ok(Json(product.into()))
}
