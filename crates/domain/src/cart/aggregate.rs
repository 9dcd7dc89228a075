//! Cart aggregate implementation.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use common::{CartId, ProductId, Version};
use serde::{Deserialize, Serialize};

use crate::money::{Money, line_total};
use crate::product::Product;

use super::{CartError, CartItem, CartOwner};

/// Cart aggregate root.
///
/// Holds at most one line per product. Totals are never stored: they are
/// folded from the lines on every read, so they cannot drift from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Assigned by the store on first save.
    id: Option<CartId>,

    /// Stored version for optimistic concurrency.
    #[serde(default)]
    version: Version,

    owner: CartOwner,

    items: BTreeMap<ProductId, CartItem>,
}

impl Cart {
    /// Creates an empty, not yet persisted cart for `owner`.
    pub fn new(owner: CartOwner) -> Self {
        Self {
            id: None,
            version: Version::initial(),
            owner,
            items: BTreeMap::new(),
        }
    }

    /// Rebuilds a stored cart.
    ///
    /// Fails with `TotalOverflow` if the lines cannot be summed.
    pub fn restore(
        id: CartId,
        owner: CartOwner,
        items: impl IntoIterator<Item = CartItem>,
        version: Version,
    ) -> Result<Self, CartError> {
        let cart = Self {
            id: Some(id),
            version,
            owner,
            items: items
                .into_iter()
                .map(|item| (item.product_id().clone(), item))
                .collect(),
        };
        Money::checked_sum(cart.items.values().map(CartItem::line_total))
            .ok_or(CartError::TotalOverflow)?;
        Ok(cart)
    }

    /// Records the id and version produced by a successful save.
    pub fn mark_saved(&mut self, id: CartId, version: Version) {
        self.id = Some(id);
        self.version = version;
    }

    /// Mutable access to the lines, for stores assigning line ids.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut CartItem> {
        self.items.values_mut()
    }
}

// Query methods
impl Cart {
    pub fn id(&self) -> Option<CartId> {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn owner(&self) -> &CartOwner {
        &self.owner
    }

    /// Returns the lines ordered by product id.
    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.get(product_id)
    }

    /// Number of distinct products in the cart.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line totals.
    ///
    /// Mutations refuse any change whose total would overflow, so the fold
    /// never saturates.
    pub fn total_price(&self) -> Money {
        self.items
            .values()
            .fold(Money::zero(), |acc, item| acc.saturating_add(item.line_total()))
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> u64 {
        self.items.values().map(|item| u64::from(item.quantity())).sum()
    }
}

// Mutations
impl Cart {
    /// Adds `quantity` units of `product`.
    ///
    /// An existing line for the product is merged: its quantity grows and the
    /// whole line is repriced at the product's current unit price.
    pub fn add_item(&mut self, product: &Product, quantity: u32) -> Result<&CartItem, CartError> {
        self.ensure_persisted()?;
        if quantity == 0 {
            return Err(CartError::InvalidQuantity { quantity });
        }

        let merged = match self.items.get(&product.id) {
            Some(item) => item.quantity().checked_add(quantity).ok_or_else(|| {
                CartError::QuantityOverflow {
                    product_id: product.id.clone(),
                }
            })?,
            None => quantity,
        };
        self.ensure_total_fits(&product.id, line_total(product.unit_price, merged)?)?;

        let item = match self.items.entry(product.id.clone()) {
            Entry::Occupied(entry) => {
                let item = entry.into_mut();
                item.set_quantity(merged, product.unit_price)?;
                item.refresh_details(product);
                item
            }
            Entry::Vacant(entry) => entry.insert(CartItem::from_product(product, merged)?),
        };
        Ok(&*item)
    }

    /// Sets the quantity of an existing line.
    ///
    /// Zero removes the line. A positive quantity reprices the line at the
    /// catalog price when `current` is known, otherwise at the line's own
    /// unit price. Returns `false` when the product is not in the cart.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
        current: Option<&Product>,
    ) -> Result<bool, CartError> {
        self.ensure_persisted()?;
        if quantity == 0 {
            return Ok(self.items.remove(product_id).is_some());
        }

        let Some(item) = self.items.get(product_id) else {
            return Ok(false);
        };
        let unit_price = current.map_or(item.unit_price(), |p| p.unit_price);
        self.ensure_total_fits(product_id, line_total(unit_price, quantity)?)?;

        if let Some(item) = self.items.get_mut(product_id) {
            item.set_quantity(quantity, unit_price)?;
            if let Some(product) = current {
                item.refresh_details(product);
            }
        }
        Ok(true)
    }

    /// Removes the line for `product_id`. Returns `false` if there was none.
    pub fn remove_item(&mut self, product_id: &ProductId) -> Result<bool, CartError> {
        self.ensure_persisted()?;
        Ok(self.items.remove(product_id).is_some())
    }

    /// Removes every line.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.ensure_persisted()?;
        self.items.clear();
        Ok(())
    }

    fn ensure_persisted(&self) -> Result<CartId, CartError> {
        self.id.ok_or(CartError::NotPersisted)
    }

    /// Checks that the cart total stays in range once the line for
    /// `product_id` is priced at `priced`.
    fn ensure_total_fits(&self, product_id: &ProductId, priced: Money) -> Result<(), CartError> {
        let others = self
            .items
            .iter()
            .filter(|(id, _)| *id != product_id)
            .map(|(_, item)| item.line_total());
        Money::checked_sum(others.chain(std::iter::once(priced)))
            .map(|_| ())
            .ok_or(CartError::TotalOverflow)
    }
}
