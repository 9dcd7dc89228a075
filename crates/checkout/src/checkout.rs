//! Checkout and order history.

use std::time::Instant;

use chrono::Utc;
use common::{OrderId, UserId};
use domain::Order;
use store::CheckoutStore;

use crate::config::StorefrontConfig;
use crate::error::{Result, ServiceError};

/// Converts a user's cart into an order and serves the order history.
pub struct CheckoutService<S: CheckoutStore> {
    store: S,
    config: StorefrontConfig,
}

impl<S: CheckoutStore> CheckoutService<S> {
    /// Creates a new checkout service.
    pub fn new(store: S, config: StorefrontConfig) -> Self {
        Self { store, config }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order for everything in the user's cart and empties the cart.
    ///
    /// The order insert and the cart clear commit together or not at all.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user: UserId) -> Result<Order> {
        metrics::counter!("checkouts_total").increment(1);
        let start = Instant::now();

        let result = self.place_order(user).await;

        metrics::histogram!("checkout_duration_seconds").record(start.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                tracing::info!(
                    order_id = ?order.id(),
                    total = %order.total_amount(),
                    lines = order.items().len(),
                    "Order placed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failures_total").increment(1);
                tracing::warn!(error = %e, "Checkout failed");
            }
        }
        result
    }

    async fn place_order(&self, user: UserId) -> Result<Order> {
        let mut attempt = 0;
        loop {
            let cart = self
                .store
                .find_cart_by_owner(user)
                .await?
                .ok_or(ServiceError::CartNotFound)?;

            let order = Order::from_cart(&cart, Utc::now())?;
            let mut emptied = cart;
            emptied.clear()?;

            match self.store.checkout(order, emptied).await {
                Ok((order, _)) => return Ok(order),
                Err(e) if e.is_conflict() => {
                    if attempt >= self.config.max_conflict_retries {
                        return Err(ServiceError::Conflict);
                    }
                    attempt += 1;
                    metrics::counter!("cart_conflict_retries_total").increment(1);
                    tracing::info!(attempt, error = %e, "Retrying checkout");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Lists the user's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>> {
        Ok(self.store.find_orders_by_owner(user).await?)
    }

    /// Fetches one of the user's orders.
    ///
    /// Orders placed by other users are reported as not found.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, user: UserId, id: OrderId) -> Result<Order> {
        self.store
            .find_order(id)
            .await?
            .filter(|order| order.is_owned_by(user))
            .ok_or(ServiceError::OrderNotFound(id))
    }
}
