//! Rendering
//!
//! Money is computed as exact decimals and only rounded here, at the last
//! step before formatting.

use std::io;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, iso};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    items::LineItem,
    pricing::{self, TaxRate},
    quotation::Quotation,
};

/// Errors that can occur while rendering.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// Format an exact decimal amount as USD.
///
/// Rounds to cents half-away-from-zero, so `5.382` renders as `$5.38` and
/// `5.385` as `$5.39`.
pub fn currency(amount: Decimal) -> String {
    let minor = (amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or_default();

    Money::from_minor(minor, iso::USD).to_string()
}

/// Format a date the way invoices show it, e.g. `June 15, 2023`.
pub fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

/// Render the cart as a table with subtotal, tax, and total rows.
///
/// # Errors
///
/// Returns a [`DisplayError`] if the table cannot be written.
pub fn write_cart(
    mut out: impl io::Write,
    lines: &[LineItem],
    rate: TaxRate,
) -> Result<(), DisplayError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit Price", "Amount"]);

    for line in lines {
        push_line_row(&mut builder, line);
    }

    let subtotal = pricing::subtotal(lines);
    let tax = pricing::tax(subtotal, rate);

    push_summary_row(&mut builder, "Subtotal", &currency(subtotal));
    push_summary_row(&mut builder, &format!("Tax ({}%)", rate.points()), &currency(tax));
    push_summary_row(&mut builder, "Total", &currency(subtotal + tax));

    write_table(&mut out, builder)
}

/// Render a quotation as an invoice table.
///
/// The discount row only appears when a discount is set; tax applies to the
/// discounted amount.
///
/// # Errors
///
/// Returns a [`DisplayError`] if the table cannot be written.
pub fn write_quotation(
    mut out: impl io::Write,
    quotation: &Quotation,
    rate: TaxRate,
) -> Result<(), DisplayError> {
    writeln!(
        out,
        "Quotation {} for {} ({})",
        quotation.id(),
        quotation.client_name(),
        long_date(quotation.date())
    )
    .map_err(|_err| DisplayError::IO)?;

    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit Price", "Amount"]);

    for line in quotation.items() {
        push_line_row(&mut builder, line);
    }

    let subtotal = quotation.subtotal();

    push_summary_row(&mut builder, "Subtotal", &currency(subtotal));

    if let Some(discount) = quotation.discount() {
        let label = format!("Discount ({}%)", discount.points());
        let amount = discount.amount_of(subtotal);

        push_summary_row(&mut builder, &label, &format!("-{}", currency(amount)));
    }

    let discounted = quotation.final_amount();
    let tax = pricing::tax(discounted, rate);

    push_summary_row(&mut builder, &format!("Tax ({}%)", rate.points()), &currency(tax));
    push_summary_row(&mut builder, "Total", &currency(discounted + tax));

    write_table(&mut out, builder)
}

fn push_line_row(builder: &mut Builder, line: &LineItem) {
    builder.push_record([
        line.name().to_owned(),
        line.quantity().get().to_string(),
        currency(line.unit_price()),
        currency(line.total()),
    ]);
}

fn push_summary_row(builder: &mut Builder, label: &str, amount: &str) {
    builder.push_record([label, "", "", amount]);
}

fn write_table(out: &mut impl io::Write, builder: Builder) -> Result<(), DisplayError> {
    let mut table = builder.build();
    let theme = Theme::from(Style::modern_rounded());

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..4), Alignment::right());

    writeln!(out, "{table}").map_err(|_err| DisplayError::IO)
}
