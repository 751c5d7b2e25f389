//! # usecase_core
//!
//! SharePoint data access and domain logic for the Use Case Library.

pub mod auth;
pub mod config;
pub mod facets;
pub mod fields;
pub mod models;
pub mod sharepoint;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
