//! Cart

use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    catalog::Catalog,
    items::{ItemError, LineItem, Quantity, QuantityChange},
    pricing::{self, TaxRate},
    products::{Product, ProductId},
    store::{self, SnapshotEntry, StateStore, StoreError},
};

/// Errors related to cart mutation or persistence.
#[derive(Debug, Error)]
pub enum CartError {
    /// Checkout was requested on an empty cart.
    #[error("the cart is empty")]
    Empty,

    /// Persistence failure from the injected store.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Line item construction failure (negative catalog price).
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// The shopping cart: selected products with quantities, kept in sync with an
/// injected [`StateStore`].
///
/// Every mutation synchronously writes the canonical snapshot and recomputes
/// the subtotal. Lines are keyed by product id, so the snapshot's
/// `{id, quantity}` pairs rehydrate by joining against the catalog.
#[derive(Debug)]
pub struct Cart<S: StateStore> {
    lines: SmallVec<[LineItem; 8]>,
    store: S,
    subtotal: Decimal,
}

impl<S: StateStore> Cart<S> {
    /// Rehydrate a cart from the store's snapshot.
    ///
    /// Entries whose id no longer resolves in the catalog (or whose quantity
    /// is no longer valid) are silently dropped, and the cleaned snapshot is
    /// written back.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the snapshot cannot be read or re-persisted.
    pub fn load(catalog: &Catalog, store: S) -> Result<Self, CartError> {
        let entries = store::load_snapshot(&store)?;

        let mut cart = Self {
            lines: SmallVec::new(),
            store,
            subtotal: Decimal::ZERO,
        };

        for entry in entries {
            let Some(product) = catalog.get(&entry.id) else {
                continue;
            };

            let Ok(quantity) = Quantity::new(entry.quantity) else {
                continue;
            };

            if cart.find(&entry.id).is_none() {
                cart.lines.push(LineItem::for_product(product, quantity)?);
            }
        }

        cart.persist()?;

        Ok(cart)
    }

    /// Start from an empty cart over the given store, discarding any snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the old snapshot cannot be cleared.
    pub fn empty(store: S) -> Result<Self, CartError> {
        let mut cart = Self {
            lines: SmallVec::new(),
            store,
            subtotal: Decimal::ZERO,
        };

        store::clear_snapshot(&mut cart.store)?;

        Ok(cart)
    }

    /// Add one unit of a product; an existing line gains quantity instead of
    /// duplicating.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the line cannot be built or persisted.
    pub fn add_item(&mut self, product: &Product) -> Result<(), CartError> {
        match self.find_mut(&product.id) {
            Some(line) => {
                line.change_quantity(QuantityChange::Delta(1));
            }
            None => {
                let line = LineItem::for_product(product, Quantity::ONE)?;
                self.lines.push(line);
            }
        }

        self.persist()?;

        Ok(())
    }

    /// Change a line's quantity.
    ///
    /// A change that would land below 1 leaves the cart untouched, as does an
    /// unknown id; neither surfaces an error.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the updated snapshot cannot be persisted.
    pub fn update_quantity(
        &mut self,
        id: &ProductId,
        change: QuantityChange,
    ) -> Result<(), CartError> {
        let changed = match self.find_mut(id) {
            Some(line) => line.change_quantity(change),
            None => false,
        };

        if changed {
            self.persist()?;
        }

        Ok(())
    }

    /// Remove a line unconditionally; unlike a quotation draft, a cart may
    /// become empty.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the updated snapshot cannot be persisted.
    pub fn remove_item(&mut self, id: &ProductId) -> Result<(), CartError> {
        let before = self.lines.len();

        self.lines.retain(|line| line.id().as_str() != id.as_str());

        if self.lines.len() != before {
            self.persist()?;
        }

        Ok(())
    }

    /// Empty the cart and its persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the snapshot cannot be cleared.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.subtotal = Decimal::ZERO;
        store::clear_snapshot(&mut self.store)?;

        Ok(())
    }

    /// Place the order: unconditional success with no payment integration.
    ///
    /// Clears both the in-memory lines and the persisted snapshot, returning
    /// the subtotal that was charged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Empty`] for an empty cart, or a store error if the
    /// snapshot cannot be cleared.
    pub fn checkout(&mut self) -> Result<Decimal, CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        let charged = self.subtotal;

        self.clear()?;

        Ok(charged)
    }

    /// The current subtotal, maintained across mutations.
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Subtotal plus tax at the given rate.
    pub fn total_with_tax(&self, rate: TaxRate) -> Decimal {
        self.subtotal + pricing::tax(self.subtotal, rate)
    }

    /// The cart lines.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Look up a line by product id.
    pub fn find(&self, id: &ProductId) -> Option<&LineItem> {
        self.lines
            .iter()
            .find(|line| line.id().as_str() == id.as_str())
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Borrow the injected store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give the store back, dropping the in-memory cart.
    pub fn into_store(self) -> S {
        self.store
    }

    fn find_mut(&mut self, id: &ProductId) -> Option<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|line| line.id().as_str() == id.as_str())
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let entries: Vec<SnapshotEntry> = self
            .lines
            .iter()
            .map(|line| SnapshotEntry {
                id: ProductId::new(line.id().as_str()),
                quantity: line.quantity().get(),
            })
            .collect();

        store::save_snapshot(&mut self.store, &entries)?;
        self.subtotal = pricing::subtotal(&self.lines);

        Ok(())
    }
}
