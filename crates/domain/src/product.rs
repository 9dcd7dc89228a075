//! Catalog product as seen by the cart.

use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// A sellable product.
///
/// Owned by the catalog; the cart only reads it when pricing a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub unit_price: Money,
}

impl Product {
    /// Creates a product with no description or image.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>, unit_price: Money) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            image_url: None,
            unit_price,
        }
    }

    /// Sets the image reference.
    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
