//! Shared types for the storefront crates.
//!
//! Identifiers are newtypes so a cart id can never be passed where an order
//! id is expected. Identity evidence is the closed set of ways a request can
//! name the shopper whose cart it wants.

pub mod identity;
pub mod types;

pub use identity::{GuestToken, IdentityEvidence, InvalidGuestToken};
pub use types::{CartId, CartItemId, OrderId, ProductId, UserId, Version};
