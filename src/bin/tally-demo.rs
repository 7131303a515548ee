//! Storefront demo
//!
//! Loads the demo fixtures, fills a cart, renders it alongside the quotation
//! book, then checks out.

use std::io::{self, Write};

use clap::Parser;

use tally::{
    cart::Cart,
    display,
    fixtures::FixtureSet,
    pricing::TaxRate,
    store::MemoryStore,
};

/// Arguments for the storefront demo
#[derive(Debug, Parser)]
struct DemoArgs {
    /// Number of catalog products to add to the cart
    #[clap(short, long)]
    n: Option<usize>,

    /// Fixture set to load the catalog & quotations from
    #[clap(short, long, default_value = "demo")]
    fixture: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = DemoArgs::parse();
    let fixtures = FixtureSet::default();

    let catalog = fixtures.load_catalog(&args.fixture)?;
    let quotations = fixtures.load_quotations(&args.fixture)?;

    let mut out = io::stdout().lock();
    let mut cart = Cart::empty(MemoryStore::new())?;

    let count = args.n.unwrap_or(catalog.len());

    for product in catalog.iter().take(count) {
        cart.add_item(product)?;
        cart.add_item(product)?;
    }

    writeln!(out, "Cart ({} lines)", cart.len())?;
    display::write_cart(&mut out, cart.lines(), TaxRate::standard())?;

    for quotation in quotations.iter() {
        writeln!(out)?;
        display::write_quotation(&mut out, quotation, TaxRate::standard())?;
    }

    let charged = cart.checkout()?;

    writeln!(out, "\nCheckout complete: {}", display::currency(charged))?;

    Ok(())
}
