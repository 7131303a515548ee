//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::items::LineItem;

/// Errors related to discount and tax construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Discount percentages live in [0, 100].
    #[error("discount percentage {0} is outside the 0-100 range")]
    DiscountOutOfRange(Decimal),

    /// Tax percentages live in [0, 100].
    #[error("tax percentage {0} is outside the 0-100 range")]
    TaxOutOfRange(Decimal),
}

/// A validated discount percentage in percent points (0-100).
///
/// Out-of-range input is rejected at construction rather than clamped, so a
/// stored discount is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountPercent {
    points: Decimal,
}

impl DiscountPercent {
    /// Create a discount from percent points (10 means 10%).
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::DiscountOutOfRange`] if `points` is outside
    /// [0, 100].
    pub fn from_percent_points(points: Decimal) -> Result<Self, PricingError> {
        if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(PricingError::DiscountOutOfRange(points));
        }

        Ok(Self { points })
    }

    /// The discount in percent points.
    pub fn points(&self) -> Decimal {
        self.points
    }

    /// The discount amount on `base`.
    pub fn amount_of(&self, base: Decimal) -> Decimal {
        Percentage::from(self.points / Decimal::ONE_HUNDRED) * base
    }
}

/// A validated tax rate in percent points (0-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxRate {
    points: Decimal,
}

impl TaxRate {
    /// The canonical 7% rate applied at every call site.
    pub fn standard() -> Self {
        Self {
            points: Decimal::from(7_u32),
        }
    }

    /// Create a tax rate from percent points.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::TaxOutOfRange`] if `points` is outside [0, 100].
    pub fn from_percent_points(points: Decimal) -> Result<Self, PricingError> {
        if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(PricingError::TaxOutOfRange(points));
        }

        Ok(Self { points })
    }

    /// The rate in percent points.
    pub fn points(&self) -> Decimal {
        self.points
    }

    /// The tax amount on `base`.
    pub fn amount_of(&self, base: Decimal) -> Decimal {
        Percentage::from(self.points / Decimal::ONE_HUNDRED) * base
    }
}

/// Sum of quantity × unit price across all items; zero for an empty list.
pub fn subtotal(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::total).sum()
}

/// Subtotal minus the discount amount; no discount leaves it unchanged.
pub fn final_amount(subtotal: Decimal, discount: Option<DiscountPercent>) -> Decimal {
    match discount {
        Some(discount) => subtotal - discount.amount_of(subtotal),
        None => subtotal,
    }
}

/// The tax amount on a subtotal.
pub fn tax(subtotal: Decimal, rate: TaxRate) -> Decimal {
    rate.amount_of(subtotal)
}
