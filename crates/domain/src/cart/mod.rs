//! Cart aggregate and related types.

mod aggregate;
mod item;
mod owner;

pub use aggregate::Cart;
pub use item::CartItem;
pub use owner::CartOwner;

use common::ProductId;
use thiserror::Error;

use crate::money::PricingError;

/// Errors that can occur during cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The cart has not been stored yet, so its lines have no parent id.
    #[error("Cart has not been persisted")]
    NotPersisted,

    /// Invalid quantity for the requested operation.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Merging quantities for a product exceeded the supported range.
    #[error("Quantity overflow for product {product_id}")]
    QuantityOverflow { product_id: ProductId },

    /// The cart total would leave the supported decimal range.
    #[error("Cart total overflows")]
    TotalOverflow,

    /// The pricing rule rejected the line.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}
