//! Integration tests for the storefront flow: fixture catalog, snapshot-backed
//! cart, mock login, and quotation lifecycle, all over a file-backed store.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use testresult::TestResult;

use tally::{
    auth::{AuthPoll, Authenticator, Credentials, Role, Session},
    cart::Cart,
    display,
    fixtures::FixtureSet,
    items::{LineItemId, QuantityChange},
    pricing::{DiscountPercent, TaxRate, final_amount},
    products::ProductId,
    quotation::{Quotation, QuotationId, QuotationStatus},
    store::{self, CART_KEY, FileStore, MemoryStore, StateStore},
};

#[test]
fn two_apples_with_a_ten_percent_discount_price_exactly() -> Result<()> {
    let catalog = FixtureSet::default().load_catalog("demo")?;
    let mut cart = Cart::empty(MemoryStore::new())?;

    let apples = catalog
        .get(&ProductId::from("p1"))
        .ok_or_else(|| anyhow!("p1 missing from the demo catalog"))?;

    cart.add_item(apples)?;
    cart.add_item(apples)?;

    // 2 x 2.99 is exactly 5.98, never 5.9800000001
    assert_eq!(cart.subtotal(), Decimal::new(598, 2));

    let discount = DiscountPercent::from_percent_points(Decimal::TEN)?;

    assert_eq!(
        final_amount(cart.subtotal(), Some(discount)),
        Decimal::new(5382, 3)
    );

    Ok(())
}

#[test]
fn cart_survives_a_restart_through_the_file_store() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.yml");
    let catalog = FixtureSet::default().load_catalog("demo")?;

    {
        let mut cart = Cart::empty(FileStore::open(&path)?)?;
        let milk = catalog
            .get(&ProductId::from("p3"))
            .ok_or_else(|| anyhow!("p3 missing from the demo catalog"))?;

        cart.add_item(milk)?;
        cart.update_quantity(&ProductId::from("p3"), QuantityChange::Set(3))?;
    }

    let reloaded = Cart::load(&catalog, FileStore::open(&path)?)?;

    assert_eq!(reloaded.len(), 1);
    assert_eq!(
        reloaded
            .find(&ProductId::from("p3"))
            .map(|line| line.quantity().get()),
        Some(3)
    );
    // 3 x 3.49
    assert_eq!(reloaded.subtotal(), Decimal::new(1047, 2));

    Ok(())
}

#[test]
fn checkout_clears_the_persisted_snapshot() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.yml");
    let catalog = FixtureSet::default().load_catalog("demo")?;

    let mut cart = Cart::empty(FileStore::open(&path)?)?;
    let bread = catalog
        .get(&ProductId::from("p4"))
        .ok_or_else(|| anyhow!("p4 missing from the demo catalog"))?;

    cart.add_item(bread)?;

    let charged = cart.checkout()?;

    assert_eq!(charged, Decimal::new(429, 2));

    let reopened = FileStore::open(&path)?;

    assert_eq!(reopened.get(CART_KEY), None);
    assert!(Cart::load(&catalog, reopened)?.is_empty());

    Ok(())
}

#[test]
fn legacy_wide_snapshots_migrate_to_the_canonical_shape() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.yml");
    let catalog = FixtureSet::default().load_catalog("demo")?;

    {
        let mut store = FileStore::open(&path)?;

        store.set(
            CART_KEY,
            "\
- id: ci1
  productId: p1
  name: Fresh Apples
  quantity: 2
  price: 2.99
",
        )?;
    }

    let cart = Cart::load(&catalog, FileStore::open(&path)?)?;

    assert_eq!(
        cart.find(&ProductId::from("p1")).map(|l| l.quantity().get()),
        Some(2)
    );

    // The migrated snapshot was written back without the legacy fields.
    let raw = cart
        .store()
        .get(CART_KEY)
        .ok_or_else(|| anyhow!("snapshot missing after migration"))?;

    assert!(raw.contains("id: p1"), "{raw}");
    assert!(!raw.contains("productId"), "{raw}");

    let entries = store::load_snapshot(cart.store())?;

    assert_eq!(entries.len(), 1);

    Ok(())
}

#[test]
fn login_persists_a_session_next_to_the_cart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.yml");

    let mut auth = Authenticator::new(Duration::ZERO);
    let now = Instant::now();
    let credentials = Credentials {
        email: "admin@example.com".to_owned(),
        password: "admin123".to_owned(),
    };

    auth.login(&credentials, now)?;

    let AuthPoll::Resolved(Some(role)) = auth.poll(now) else {
        bail!("login did not resolve");
    };

    {
        let mut store = FileStore::open(&path)?;
        Session { role }.save(&mut store)?;
    }

    let store = FileStore::open(&path)?;

    assert_eq!(Session::load(&store), Some(Session { role: Role::Admin }));

    Ok(())
}

#[test]
fn sent_demo_quotation_accepts_and_renders() -> Result<()> {
    let book = FixtureSet::default().load_quotations("demo")?;

    let mut quotation = book
        .get(&QuotationId::from("q1"))
        .ok_or_else(|| anyhow!("q1 missing from the demo set"))?
        .clone();

    // 10 x 149.99 + 4 x 399.00 = 3095.90, less 10%
    assert_eq!(quotation.subtotal(), Decimal::new(309590, 2));
    assert_eq!(quotation.final_amount(), Decimal::new(278631, 2));

    quotation.accept()?;

    assert_eq!(quotation.status(), QuotationStatus::Accepted);

    let mut rendered = Vec::new();

    display::write_quotation(&mut rendered, &quotation, TaxRate::standard())?;

    let rendered = String::from_utf8(rendered)?;

    assert!(rendered.contains("Acme Industries"), "{rendered}");
    assert!(rendered.contains("June 15, 2023"), "{rendered}");
    assert!(rendered.contains("Discount (10%)"), "{rendered}");

    Ok(())
}

#[test]
fn draft_refuses_to_send_unnamed_items() -> TestResult {
    let date: NaiveDate = "2023-07-02".parse()?;
    let mut quotation = Quotation::draft(
        QuotationId::from("q9"),
        LineItemId::from("q9-item1"),
        date,
    );

    quotation.set_client_name("Globex Corporation");

    assert!(quotation.send().is_err());

    quotation.update_item_name(&LineItemId::from("q9-item1"), "Monitor Arms");
    quotation.update_item_price(&LineItemId::from("q9-item1"), Decimal::new(5950, 2))?;

    quotation.send()?;

    assert_eq!(quotation.status(), QuotationStatus::Sent);

    Ok(())
}
