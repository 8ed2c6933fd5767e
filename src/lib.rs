//! Table Billing library crate.
//!
//! This crate turns the completed orders of a QR-code table ordering
//! system into per-customer bills with GST applied.  External
//! applications may depend on the `table_billing` crate and call into
//! `engine::run_billing` directly, manage the owner's tax settings via
//! the `settings` module, or embed the API via `api::build_router`.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod money;
pub mod settings;
pub mod tax;

pub use error::{BillingError, Result};
