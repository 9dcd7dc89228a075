//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::money::Money;

use super::{OrderError, OrderItem, OrderStatus};

/// Order aggregate root.
///
/// Immutable once placed, apart from `status`, which this crate never
/// advances past `Pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Assigned by the store on save.
    id: Option<OrderId>,

    owner: UserId,

    created_at: DateTime<Utc>,

    status: OrderStatus,

    /// Sum of the item line totals at creation time.
    total_amount: Money,

    items: Vec<OrderItem>,
}

impl Order {
    /// Snapshots a user's cart into a new pending order.
    ///
    /// The cart's line totals are authoritative; the catalog is not consulted.
    pub fn from_cart(cart: &Cart, created_at: DateTime<Utc>) -> Result<Self, OrderError> {
        let owner = cart.owner().user_id().ok_or(OrderError::GuestCart)?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let items: Vec<OrderItem> = cart.items().map(OrderItem::from).collect();
        let total_amount = Money::checked_sum(items.iter().map(|item| item.line_total))
            .ok_or(OrderError::TotalOverflow)?;

        Ok(Self {
            id: None,
            owner,
            created_at,
            status: OrderStatus::Pending,
            total_amount,
            items,
        })
    }

    /// Rebuilds a stored order.
    pub fn restore(
        id: OrderId,
        owner: UserId,
        created_at: DateTime<Utc>,
        status: OrderStatus,
        total_amount: Money,
        items: Vec<OrderItem>,
    ) -> Self {
        Self {
            id: Some(id),
            owner,
            created_at,
            status,
            total_amount,
            items,
        }
    }

    /// Records the id the store assigned.
    pub fn assign_id(&mut self, id: OrderId) {
        self.id = Some(id);
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> Option<OrderId> {
        self.id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns true if `user` placed this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }
}
