//! Domain layer for the storefront.
//!
//! This crate provides the pure, synchronous core of cart and checkout:
//! - Exact decimal money and the line pricing rule
//! - Cart aggregate with merge-on-add and derived totals
//! - Order aggregate built as a frozen snapshot of a cart

pub mod cart;
pub mod money;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartItem, CartOwner};
pub use money::{Money, PricingError, line_total};
pub use order::{Order, OrderError, OrderItem, OrderStatus, UnknownOrderStatus};
pub use product::Product;
