use common::{CartItemId, ProductId};
use serde::{Deserialize, Serialize};

use crate::money::{Money, line_total};
use crate::product::Product;

use super::CartError;

/// One product line in a cart.
///
/// `line_total` always equals `unit_price * quantity`; every constructor and
/// mutator recomputes it before returning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    id: Option<CartItemId>,
    product_id: ProductId,
    product_name: String,
    image_url: Option<String>,
    unit_price: Money,
    quantity: u32,
    line_total: Money,
}

impl CartItem {
    pub(crate) fn from_product(product: &Product, quantity: u32) -> Result<Self, CartError> {
        Ok(Self {
            id: None,
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            image_url: product.image_url.clone(),
            unit_price: product.unit_price,
            quantity,
            line_total: line_total(product.unit_price, quantity)?,
        })
    }

    /// Rebuilds a stored line, recomputing its total from price and quantity.
    pub fn restore(
        id: CartItemId,
        product_id: ProductId,
        product_name: String,
        image_url: Option<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, CartError> {
        Ok(Self {
            id: Some(id),
            line_total: line_total(unit_price, quantity)?,
            product_id,
            product_name,
            image_url,
            unit_price,
            quantity,
        })
    }

    pub fn id(&self) -> Option<CartItemId> {
        self.id
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Unit price used for the current line total.
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }

    /// Records the id the store assigned to this line.
    pub fn assign_id(&mut self, id: CartItemId) {
        self.id = Some(id);
    }

    /// Sets the quantity and reprices the line at `unit_price`.
    ///
    /// Leaves the line untouched when the pricing rule rejects the input.
    pub(crate) fn set_quantity(&mut self, quantity: u32, unit_price: Money) -> Result<(), CartError> {
        let total = line_total(unit_price, quantity)?;
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.line_total = total;
        Ok(())
    }

    /// Refreshes the display snapshot from the catalog entry.
    pub(crate) fn refresh_details(&mut self, product: &Product) {
        self.product_name.clone_from(&product.name);
        self.image_url.clone_from(&product.image_url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn widget() -> Product {
        Product::new("SKU-001", "Widget", Money::new(dec!(12.50))).with_image("/img/widget.png")
    }

    #[test]
    fn test_from_product_prices_line() {
        let item = CartItem::from_product(&widget(), 4).unwrap();
        assert_eq!(item.id(), None);
        assert_eq!(item.quantity(), 4);
        assert_eq!(item.line_total(), Money::new(dec!(50.00)));
        assert_eq!(item.image_url(), Some("/img/widget.png"));
    }

    #[test]
    fn test_set_quantity_recomputes_total() {
        let mut item = CartItem::from_product(&widget(), 1).unwrap();
        item.set_quantity(3, Money::new(dec!(10.00))).unwrap();
        assert_eq!(item.unit_price(), Money::new(dec!(10.00)));
        assert_eq!(item.line_total(), Money::new(dec!(30.00)));
    }

    #[test]
    fn test_rejected_update_leaves_line_untouched() {
        let mut item = CartItem::from_product(&widget(), 2).unwrap();
        let before = item.clone();
        assert!(item.set_quantity(0, Money::new(dec!(1))).is_err());
        assert_eq!(item, before);
    }

    #[test]
    fn test_restore_recomputes_total() {
        let id = CartItemId::generate();
        let item = CartItem::restore(
            id,
            ProductId::new("SKU-9"),
            "Gadget".to_string(),
            None,
            Money::new(dec!(3.33)),
            3,
        )
        .unwrap();
        assert_eq!(item.id(), Some(id));
        assert_eq!(item.line_total(), Money::new(dec!(9.99)));
    }
}
