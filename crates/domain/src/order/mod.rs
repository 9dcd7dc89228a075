//! Order aggregate and related types.

mod aggregate;
mod item;
mod state;

pub use aggregate::Order;
pub use item::OrderItem;
pub use state::{OrderStatus, UnknownOrderStatus};

use thiserror::Error;

/// Errors that can occur when placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Only carts of registered users can be checked out.
    #[error("Guest carts cannot be checked out")]
    GuestCart,

    /// Order has no items.
    #[error("Cannot create an order from an empty cart")]
    EmptyCart,

    /// The line totals do not fit in a single order total.
    #[error("Order total overflows")]
    TotalOverflow,
}
