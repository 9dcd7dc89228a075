//! Exact decimal money and the line pricing rule.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the pricing rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Quantity must be at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    NonPositiveQuantity { quantity: u32 },

    /// Unit prices cannot be negative.
    #[error("Invalid unit price: {price} (must not be negative)")]
    NegativeUnitPrice { price: Money },

    /// The product of price and quantity does not fit the decimal range.
    #[error("Line total overflows for unit price {price} and quantity {quantity}")]
    Overflow { price: Money, quantity: u32 },
}

/// A monetary amount in the store's single currency.
///
/// Backed by a base-10 decimal so that repeated additions never drift the way
/// binary floating point does. Serialized as a string (e.g. `"100.00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates an amount from minor units (`1234` → `12.34`).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Adds two amounts, clamping at the decimal range.
    pub fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Sums amounts, returning `None` if the total leaves the decimal range.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(Decimal::from(quantity)).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

/// Computes the price of a cart or order line.
///
/// `unit_price * quantity`, exactly. No rounding is applied.
pub fn line_total(unit_price: Money, quantity: u32) -> Result<Money, PricingError> {
    if quantity == 0 {
        return Err(PricingError::NonPositiveQuantity { quantity });
    }
    if unit_price.is_negative() {
        return Err(PricingError::NegativeUnitPrice { price: unit_price });
    }
    unit_price
        .checked_multiply(quantity)
        .ok_or(PricingError::Overflow {
            price: unit_price,
            quantity,
        })
}
