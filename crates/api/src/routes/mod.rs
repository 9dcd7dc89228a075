//! HTTP route handlers and shared state.

pub mod cart;
pub mod health;
pub mod metrics;
pub mod orders;
pub mod products;

use checkout::{CartService, CheckoutService};
use store::{CheckoutStore, ProductCatalog};

/// Shared application state accessible from all handlers.
pub struct AppState<S, C>
where
    S: CheckoutStore,
    C: ProductCatalog,
{
    pub carts: CartService<S, C>,
    pub checkout: CheckoutService<S>,
    pub guest_cookie_max_age_secs: u64,
}
