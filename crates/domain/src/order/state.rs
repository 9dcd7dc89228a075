//! Order status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status string that does not name a known order status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

/// The status of a placed order.
///
/// Checkout only ever produces `Pending`. Later transitions belong to the
/// fulfillment side and are not modelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been placed and awaits fulfillment.
    #[default]
    Pending,
}

impl OrderStatus {
    /// Returns the status name as stored and serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}
