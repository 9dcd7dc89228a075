//! Cart mutation service.

use common::{IdentityEvidence, ProductId};
use domain::{Cart, Product};
use store::{CartStore, ProductCatalog};

use crate::config::StorefrontConfig;
use crate::error::{Result, ServiceError};
use crate::resolver::CartResolver;

/// Service for reading and changing the shopper's cart.
///
/// Every mutation resolves the cart, applies the change to the aggregate and
/// saves it under the version that was read. A lost version race replays the
/// whole sequence against the fresh cart, up to the configured retry bound.
pub struct CartService<S: CartStore, C: ProductCatalog> {
    resolver: CartResolver<S>,
    catalog: C,
    config: StorefrontConfig,
}

impl<S: CartStore, C: ProductCatalog> CartService<S, C> {
    /// Creates a new cart service.
    pub fn new(store: S, catalog: C, config: StorefrontConfig) -> Self {
        Self {
            resolver: CartResolver::new(store),
            catalog,
            config,
        }
    }

    /// Returns a reference to the cart resolver.
    pub fn resolver(&self) -> &CartResolver<S> {
        &self.resolver
    }

    /// Returns a reference to the product catalog.
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Returns the identity's cart, creating it on first access.
    pub async fn get_cart(&self, identity: &IdentityEvidence) -> Result<Cart> {
        self.resolver.resolve(identity).await
    }

    /// Adds `quantity` units of a product, merging into an existing line.
    #[tracing::instrument(skip(self))]
    pub async fn add_item(
        &self,
        identity: &IdentityEvidence,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        if quantity == 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be at least 1".to_string(),
            ));
        }

        let product = self
            .catalog
            .get_product(product_id)
            .await?
            .ok_or_else(|| ServiceError::ProductNotFound(product_id.clone()))?;

        self.execute(identity, "add_item", |cart| {
            cart.add_item(&product, quantity)?;
            Ok(true)
        })
        .await
    }

    /// Sets the quantity of a line. Zero removes it; an absent line is left alone.
    #[tracing::instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        identity: &IdentityEvidence,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Cart> {
        let current: Option<Product> = if quantity > 0 {
            self.catalog.get_product(product_id).await?
        } else {
            None
        };

        self.execute(identity, "update_quantity", |cart| {
            Ok(cart.update_quantity(product_id, quantity, current.as_ref())?)
        })
        .await
    }

    /// Removes a line. Removing an absent line succeeds.
    #[tracing::instrument(skip(self))]
    pub async fn remove_item(
        &self,
        identity: &IdentityEvidence,
        product_id: &ProductId,
    ) -> Result<Cart> {
        self.execute(identity, "remove_item", |cart| {
            Ok(cart.remove_item(product_id)?)
        })
        .await
    }

    /// Removes every line.
    #[tracing::instrument(skip(self))]
    pub async fn clear(&self, identity: &IdentityEvidence) -> Result<Cart> {
        self.execute(identity, "clear", |cart| {
            let had_items = !cart.is_empty();
            cart.clear()?;
            Ok(had_items)
        })
        .await
    }

    /// Resolves, mutates and saves the cart, replaying on version conflicts.
    ///
    /// `mutate` reports whether it changed the cart; an unchanged cart is
    /// returned without a write.
    async fn execute<F>(
        &self,
        identity: &IdentityEvidence,
        operation: &'static str,
        mut mutate: F,
    ) -> Result<Cart>
    where
        F: FnMut(&mut Cart) -> Result<bool>,
    {
        let mut attempt = 0;
        loop {
            let mut cart = self.resolver.resolve(identity).await?;
            if !mutate(&mut cart)? {
                return Ok(cart);
            }

            match self.resolver.store().save_cart(cart).await {
                Ok(saved) => {
                    metrics::counter!("cart_mutations_total", "operation" => operation)
                        .increment(1);
                    return Ok(saved);
                }
                Err(e) if e.is_conflict() => {
                    if attempt >= self.config.max_conflict_retries {
                        tracing::warn!(operation, attempt, "Giving up after repeated cart conflicts");
                        return Err(ServiceError::Conflict);
                    }
                    attempt += 1;
                    metrics::counter!("cart_conflict_retries_total").increment(1);
                    tracing::info!(operation, attempt, error = %e, "Retrying cart mutation");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
