//! Catalog domain module: hubs and SKUs.
//!
//! This crate contains the creation rules for the two referenced resources,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod hub;
pub mod sku;

pub use hub::{Hub, NewHub};
pub use sku::{NewSku, Sku};
