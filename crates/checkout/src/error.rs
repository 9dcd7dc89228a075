//! Service error types.

use common::{OrderId, ProductId};
use domain::{CartError, OrderError};
use store::StoreError;
use thiserror::Error;

/// Errors returned by the cart and checkout services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or out-of-range input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The catalog has no such product.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The identity has no cart.
    #[error("Cart not found")]
    CartNotFound,

    /// Checkout was attempted on a cart without items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The order does not exist or belongs to someone else.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Concurrent writers kept winning until the retry budget ran out.
    #[error("Cart was modified concurrently, please retry")]
    Conflict,

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<CartError> for ServiceError {
    fn from(e: CartError) -> Self {
        ServiceError::InvalidArgument(e.to_string())
    }
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyCart => ServiceError::EmptyCart,
            OrderError::GuestCart | OrderError::TotalOverflow => {
                ServiceError::InvalidArgument(e.to_string())
            }
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
