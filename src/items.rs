//! Line items

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::products::Product;

/// Errors related to line item construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ItemError {
    /// Quantity must be a positive integer.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// Unit prices are non-negative.
    #[error("unit price {0} is negative")]
    NegativePrice(Decimal),
}

/// Identifier of a line item within its aggregate.
///
/// Cart lines use the product identifier; quotation lines carry their own ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineItemId(String);

impl LineItemId {
    /// Create a new line item id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LineItemId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A positive item count.
///
/// Zero is not representable, so "quantity below 1" can only occur as a
/// rejected transition, never as stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(u32);

/// A requested change to a line item's quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Adjust the current quantity by a signed amount.
    Delta(i64),

    /// Replace the current quantity.
    Set(u32),
}

impl Quantity {
    /// A quantity of one, the floor for every line item.
    pub const ONE: Self = Self(1);

    /// Create a quantity from a count.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::ZeroQuantity`] if `count` is zero.
    pub fn new(count: u32) -> Result<Self, ItemError> {
        if count == 0 {
            return Err(ItemError::ZeroQuantity);
        }

        Ok(Self(count))
    }

    /// The count as a plain integer.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Apply a change, returning `None` when the result would drop below 1
    /// (or overflow). Callers treat `None` as "leave the line unchanged".
    pub fn apply(self, change: QuantityChange) -> Option<Self> {
        let next = match change {
            QuantityChange::Delta(delta) => i64::from(self.0).checked_add(delta)?,
            QuantityChange::Set(value) => i64::from(value),
        };

        u32::try_from(next).ok().filter(|n| *n >= 1).map(Self)
    }
}

/// A single priced, quantified entry within a cart or quotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    id: LineItemId,
    name: String,
    quantity: Quantity,
    unit_price: Decimal,
}

impl LineItem {
    /// Create a new line item.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::NegativePrice`] if `unit_price` is negative.
    pub fn new(
        id: LineItemId,
        name: impl Into<String>,
        quantity: Quantity,
        unit_price: Decimal,
    ) -> Result<Self, ItemError> {
        if unit_price < Decimal::ZERO {
            return Err(ItemError::NegativePrice(unit_price));
        }

        Ok(Self {
            id,
            name: name.into(),
            quantity,
            unit_price,
        })
    }

    /// A blank line: no name, quantity 1, price 0.
    ///
    /// New quotation drafts start with exactly one of these.
    pub fn blank(id: LineItemId) -> Self {
        Self {
            id,
            name: String::new(),
            quantity: Quantity::ONE,
            unit_price: Decimal::ZERO,
        }
    }

    /// Build a cart line for a catalog product, keyed by the product id.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::NegativePrice`] if the catalog price is negative.
    pub fn for_product(product: &Product, quantity: Quantity) -> Result<Self, ItemError> {
        Self::new(
            LineItemId::new(product.id.as_str()),
            product.name.clone(),
            quantity,
            product.price,
        )
    }

    /// The line item id.
    pub fn id(&self) -> &LineItemId {
        &self.id
    }

    /// The display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The quantity.
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// The unit price.
    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Quantity × unit price.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity.get()) * self.unit_price
    }

    /// Rename the line item.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the unit price.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::NegativePrice`] if `unit_price` is negative.
    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<(), ItemError> {
        if unit_price < Decimal::ZERO {
            return Err(ItemError::NegativePrice(unit_price));
        }

        self.unit_price = unit_price;
        Ok(())
    }

    /// Apply a quantity change; below-floor results leave the line unchanged.
    ///
    /// Returns whether the quantity actually changed.
    pub fn change_quantity(&mut self, change: QuantityChange) -> bool {
        match self.quantity.apply(change) {
            Some(next) => {
                self.quantity = next;
                true
            }
            None => false,
        }
    }
}
