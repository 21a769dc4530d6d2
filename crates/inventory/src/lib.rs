//! Inventory domain module.
//!
//! This crate contains the stock rules for per-hub inventory rows, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod stock;

pub use stock::{HubInventory, InventoryKey, InventoryRowId};
