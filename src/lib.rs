//! Tally
//!
//! Tally is a quotation and shopping-cart computation engine: exact decimal pricing, draft-to-decision quotation lifecycles, and a snapshot-persisted cart over pluggable state stores.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod display;
pub mod fixtures;
pub mod items;
pub mod pricing;
pub mod products;
pub mod quotation;
pub mod store;
