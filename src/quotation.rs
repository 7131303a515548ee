//! Quotations

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use smallvec::{SmallVec, smallvec};
use thiserror::Error;

use crate::{
    items::{ItemError, LineItem, LineItemId, QuantityChange},
    pricing::{self, DiscountPercent},
};

new_key_type! {
    /// Quotation Key
    pub struct QuotationKey;
}

/// Identifier of a quotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotationId(String);

impl QuotationId {
    /// Create a new quotation id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuotationId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Lifecycle status of a quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotationStatus {
    /// Being edited; not yet submitted.
    Draft,

    /// Submitted to the client.
    Sent,

    /// Accepted by the client.
    Accepted,

    /// Declined by the client.
    Declined,
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        };

        f.write_str(label)
    }
}

/// Submission validation failures; they block the transition and leave the
/// draft untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The client name field is required.
    #[error("client name is required")]
    MissingClientName,

    /// Every line item needs a name before submission.
    #[error("item {0} has no name")]
    UnnamedItem(LineItemId),
}

/// An illegal lifecycle transition.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot move quotation from {from} to {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: QuotationStatus,

    /// Requested status.
    pub to: QuotationStatus,
}

/// Errors related to quotation editing and submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuotationError {
    /// Submission validation failure.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Illegal lifecycle transition.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Line item rejection.
    #[error(transparent)]
    Item(#[from] ItemError),
}

/// A quotation: client, dated line items, optional discount and a lifecycle
/// status.
///
/// A draft always holds at least one line item; removal of the sole remaining
/// line is a no-op.
#[derive(Debug, Clone)]
pub struct Quotation {
    id: QuotationId,
    client_name: String,
    date: NaiveDate,
    items: SmallVec<[LineItem; 4]>,
    discount: Option<DiscountPercent>,
    status: QuotationStatus,
}

impl Quotation {
    /// Start a new draft with a single blank line item.
    pub fn draft(id: QuotationId, first_item: LineItemId, date: NaiveDate) -> Self {
        Self {
            id,
            client_name: String::new(),
            date,
            items: smallvec![LineItem::blank(first_item)],
            discount: None,
            status: QuotationStatus::Draft,
        }
    }

    /// Build a fully-formed quotation, as loaded from fixture data.
    ///
    /// An empty item list gets a blank line so the at-least-one-item
    /// invariant holds from the start.
    pub fn new(
        id: QuotationId,
        client_name: impl Into<String>,
        date: NaiveDate,
        items: Vec<LineItem>,
        discount: Option<DiscountPercent>,
        status: QuotationStatus,
    ) -> Self {
        let mut items: SmallVec<[LineItem; 4]> = items.into();

        if items.is_empty() {
            items.push(LineItem::blank(LineItemId::new(format!(
                "{}-item1",
                id.as_str()
            ))));
        }

        Self {
            id,
            client_name: client_name.into(),
            date,
            items,
            discount,
            status,
        }
    }

    /// The quotation id.
    pub fn id(&self) -> &QuotationId {
        &self.id
    }

    /// The client this quotation is addressed to.
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// The quotation date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The line items; never empty.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The discount, if any.
    pub fn discount(&self) -> Option<DiscountPercent> {
        self.discount
    }

    /// The lifecycle status.
    pub fn status(&self) -> QuotationStatus {
        self.status
    }

    /// Set the client name.
    pub fn set_client_name(&mut self, name: impl Into<String>) {
        self.client_name = name.into();
    }

    /// Set or clear the discount.
    pub fn set_discount(&mut self, discount: Option<DiscountPercent>) {
        self.discount = discount;
    }

    /// Append a blank line item to the draft.
    pub fn add_blank_item(&mut self, id: LineItemId) {
        self.items.push(LineItem::blank(id));
    }

    /// Append a prepared line item.
    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    /// Rename a line item; unknown ids are ignored.
    pub fn update_item_name(&mut self, id: &LineItemId, name: &str) {
        if let Some(item) = self.find_mut(id) {
            item.set_name(name);
        }
    }

    /// Re-price a line item; unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError::NegativePrice`] if `unit_price` is negative; the
    /// item keeps its previous price.
    pub fn update_item_price(
        &mut self,
        id: &LineItemId,
        unit_price: Decimal,
    ) -> Result<(), ItemError> {
        match self.find_mut(id) {
            Some(item) => item.set_unit_price(unit_price),
            None => Ok(()),
        }
    }

    /// Change a line item's quantity; below-floor results and unknown ids
    /// leave the draft unchanged.
    pub fn update_item_quantity(&mut self, id: &LineItemId, change: QuantityChange) {
        if let Some(item) = self.find_mut(id) {
            item.change_quantity(change);
        }
    }

    /// Remove a line item. Removing the sole remaining line is a no-op: a
    /// draft always keeps at least one item.
    pub fn remove_item(&mut self, id: &LineItemId) {
        if self.items.len() == 1 {
            return;
        }

        self.items.retain(|item| item.id() != id);
    }

    /// Sum of quantity × unit price across the line items.
    pub fn subtotal(&self) -> Decimal {
        pricing::subtotal(&self.items)
    }

    /// Subtotal less the discount, if any.
    pub fn final_amount(&self) -> Decimal {
        pricing::final_amount(self.subtotal(), self.discount)
    }

    /// Check the draft is submittable: a client name and a name on every line.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_name.trim().is_empty() {
            return Err(ValidationError::MissingClientName);
        }

        for item in &self.items {
            if item.name().trim().is_empty() {
                return Err(ValidationError::UnnamedItem(item.id().clone()));
            }
        }

        Ok(())
    }

    /// Validate and keep the quotation as a draft (the "save as draft" path).
    ///
    /// # Errors
    ///
    /// Returns a [`QuotationError`] if validation fails or the quotation has
    /// already left the draft state.
    pub fn save_draft(&mut self) -> Result<(), QuotationError> {
        self.transition_from_draft(QuotationStatus::Draft)
    }

    /// Validate and submit: `Draft → Sent`.
    ///
    /// # Errors
    ///
    /// Returns a [`QuotationError`] if validation fails or the quotation is
    /// not a draft.
    pub fn send(&mut self) -> Result<(), QuotationError> {
        self.transition_from_draft(QuotationStatus::Sent)
    }

    /// Client accepted: `Sent → Accepted`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the quotation is currently sent.
    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.transition_from_sent(QuotationStatus::Accepted)
    }

    /// Client declined: `Sent → Declined`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] unless the quotation is currently sent.
    pub fn decline(&mut self) -> Result<(), TransitionError> {
        self.transition_from_sent(QuotationStatus::Declined)
    }

    fn transition_from_draft(&mut self, to: QuotationStatus) -> Result<(), QuotationError> {
        if self.status != QuotationStatus::Draft {
            return Err(TransitionError {
                from: self.status,
                to,
            }
            .into());
        }

        self.validate()?;
        self.status = to;

        Ok(())
    }

    fn transition_from_sent(&mut self, to: QuotationStatus) -> Result<(), TransitionError> {
        if self.status != QuotationStatus::Sent {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        self.status = to;

        Ok(())
    }

    fn find_mut(&mut self, id: &LineItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }
}

/// The fixed, read-only store of saved quotations.
#[derive(Debug, Default)]
pub struct QuotationBook {
    entries: SlotMap<QuotationKey, Quotation>,
    ids: FxHashMap<QuotationId, QuotationKey>,
}

impl QuotationBook {
    /// Build a book from a fixed list of quotations; a repeated id replaces
    /// the earlier record.
    pub fn new(quotations: impl IntoIterator<Item = Quotation>) -> Self {
        let mut book = Self::default();

        for quotation in quotations {
            let id = quotation.id().clone();

            if let Some(&key) = book.ids.get(&id) {
                if let Some(slot) = book.entries.get_mut(key) {
                    *slot = quotation;
                }
            } else {
                let key = book.entries.insert(quotation);
                book.ids.insert(id, key);
            }
        }

        book
    }

    /// Look up a quotation by identifier; a miss is a recoverable absence.
    pub fn get(&self, id: &QuotationId) -> Option<&Quotation> {
        self.ids.get(id).and_then(|key| self.entries.get(*key))
    }

    /// Iterate over all quotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Quotation> {
        self.entries.values()
    }

    /// Number of quotations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
