use common::ProductId;
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::money::Money;

/// A line of a placed order.
///
/// Frozen copy of the cart line at checkout time. Later catalog price
/// changes never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&CartItem> for OrderItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id().clone(),
            product_name: item.product_name().to_string(),
            quantity: item.quantity(),
            line_total: item.line_total(),
        }
    }
}
