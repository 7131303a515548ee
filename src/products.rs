//! Products

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Catalog identifier of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Catalog identifier
    pub id: ProductId,

    /// Product name
    pub name: String,

    /// Category label
    pub category: String,

    /// Short description
    pub description: String,

    /// Unit price
    pub price: Decimal,

    /// Units in stock
    pub stock: u32,
}
