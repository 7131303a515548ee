//! Fixtures
//!
//! Demo data lives in YAML files under a base directory, one file per named
//! set: `catalog/<name>.yml` and `quotations/<name>.yml`. Records are keyed
//! by id, so a set reads as a map and loads in key order.

use std::{collections::BTreeMap, fs, io, path::PathBuf};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    catalog::Catalog,
    items::{ItemError, LineItem, LineItemId, Quantity},
    pricing::{DiscountPercent, PricingError},
    products::{Product, ProductId},
    quotation::{Quotation, QuotationBook, QuotationId, QuotationStatus},
};

/// Errors that can occur when loading fixture data.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture file could not be read.
    #[error("failed to read fixture file {path}: {source}")]
    Io {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },

    /// The fixture file did not parse.
    #[error("failed to parse fixture file {path}: {source}")]
    Yaml {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_norway::Error,
    },

    /// A quotation fixture carried an out-of-range discount.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A fixture line item could not be built.
    #[error(transparent)]
    Item(#[from] ItemError),
}

#[derive(Debug, Deserialize)]
struct ProductFixture {
    name: String,
    category: String,
    description: String,
    price: Decimal,
    stock: u32,
}

#[derive(Debug, Deserialize)]
struct ItemFixture {
    id: String,
    name: String,
    quantity: u32,
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct QuotationFixture {
    client: String,
    date: NaiveDate,
    status: QuotationStatus,
    #[serde(default)]
    discount: Option<Decimal>,
    items: Vec<ItemFixture>,
}

/// A directory of named fixture sets.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    base_path: PathBuf,
}

impl Default for FixtureSet {
    fn default() -> Self {
        Self::with_base_path("./fixtures")
    }
}

impl FixtureSet {
    /// Use a base directory other than `./fixtures`.
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load the named catalog set from `catalog/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the file cannot be read or parsed.
    pub fn load_catalog(&self, name: &str) -> Result<Catalog, FixtureError> {
        let records: BTreeMap<String, ProductFixture> = self.read(&format!("catalog/{name}.yml"))?;

        Ok(Catalog::new(records.into_iter().map(|(id, record)| {
            Product {
                id: ProductId::new(id),
                name: record.name,
                category: record.category,
                description: record.description,
                price: record.price,
                stock: record.stock,
            }
        })))
    }

    /// Load the named quotation set from `quotations/<name>.yml`.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if the file cannot be read or parsed, if a
    /// discount falls outside 0 to 100, or if a line item is invalid.
    pub fn load_quotations(&self, name: &str) -> Result<QuotationBook, FixtureError> {
        let records: BTreeMap<String, QuotationFixture> =
            self.read(&format!("quotations/{name}.yml"))?;

        let mut quotations = Vec::with_capacity(records.len());

        for (id, record) in records {
            quotations.push(build_quotation(id, record)?);
        }

        Ok(QuotationBook::new(quotations))
    }

    fn read<T: serde::de::DeserializeOwned>(&self, relative: &str) -> Result<T, FixtureError> {
        let path = self.base_path.join(relative);

        let contents = fs::read_to_string(&path).map_err(|source| FixtureError::Io {
            path: path.clone(),
            source,
        })?;

        serde_norway::from_str(&contents).map_err(|source| FixtureError::Yaml { path, source })
    }
}

fn build_quotation(id: String, record: QuotationFixture) -> Result<Quotation, FixtureError> {
    let mut items = Vec::with_capacity(record.items.len());

    for item in record.items {
        items.push(LineItem::new(
            LineItemId::new(item.id),
            item.name,
            Quantity::new(item.quantity)?,
            item.price,
        )?);
    }

    let discount = record
        .discount
        .map(DiscountPercent::from_percent_points)
        .transpose()?;

    Ok(Quotation::new(
        QuotationId::from(id.as_str()),
        record.client,
        record.date,
        items,
        discount,
        record.status,
    ))
}
