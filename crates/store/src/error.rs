use common::{CartId, Version};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The cart was written by someone else since it was read.
    #[error(
        "Concurrency conflict for cart {cart_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        cart_id: CartId,
        expected: Version,
        actual: Version,
    },

    /// The cart was not found in the store.
    #[error("Cart not found: {0}")]
    CartNotFound(CartId),

    /// A cart without a store-assigned id was handed to an update.
    #[error("Cart has not been created in the store")]
    UnsavedCart,

    /// A stored row could not be turned back into an aggregate.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// The backing store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true for optimistic concurrency conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
