//! Storefront application services.
//!
//! Ties the cart and order aggregates to the stores:
//! 1. Resolve the request identity to its cart
//! 2. Apply cart mutations under optimistic concurrency
//! 3. Convert a user's cart into an order in one store transaction

pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod resolver;

pub use cart::CartService;
pub use checkout::CheckoutService;
pub use config::StorefrontConfig;
pub use error::{Result, ServiceError};
pub use resolver::CartResolver;
