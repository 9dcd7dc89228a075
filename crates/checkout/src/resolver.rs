//! Identity to cart resolution.

use common::IdentityEvidence;
use domain::{Cart, CartOwner};
use store::{CartStore, CartStoreExt};

use crate::error::Result;

/// Maps the identity of a request to exactly one persisted cart.
#[derive(Debug, Clone)]
pub struct CartResolver<S: CartStore> {
    store: S,
}

impl<S: CartStore> CartResolver<S> {
    /// Creates a resolver over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the identity's cart, creating and persisting an empty one on
    /// first access.
    ///
    /// Concurrent first accesses for the same identity yield the same cart.
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, identity: &IdentityEvidence) -> Result<Cart> {
        let owner = CartOwner::from(identity);
        Ok(self.store.find_or_create_cart(&owner).await?)
    }

    /// Returns the identity's cart if it has one, without creating it.
    #[tracing::instrument(skip(self))]
    pub async fn find(&self, identity: &IdentityEvidence) -> Result<Option<Cart>> {
        let owner = CartOwner::from(identity);
        Ok(self.store.find_cart(&owner).await?)
    }
}
