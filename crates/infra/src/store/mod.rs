//! Record store abstractions consumed by the validator, the adjuster and the
//! HTTP layer.
//!
//! Every store is an async, object-safe trait so callers can hold an
//! `Arc<dyn …Store>` and swap the in-memory implementation for Postgres
//! without touching business code.

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use wms_catalog::{Hub, Sku};
use wms_core::{HubId, SkuId};
use wms_inventory::{HubInventory, InventoryKey, InventoryRowId};

pub use in_memory::InMemoryWarehouseStore;
pub use postgres::PostgresWarehouseStore;

/// Store operation error.
///
/// Absence of a record is not an error: lookups return `Ok(None)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database { operation: &'static str, message: String },

    /// A uniqueness constraint rejected the write.
    #[error("conflict in {operation}: {message}")]
    Conflict { operation: &'static str, message: String },

    /// A write targeted a row that does not exist.
    #[error("{operation}: {message}")]
    Missing { operation: &'static str, message: String },

    /// A row came back in a shape we could not decode.
    #[error("failed to decode row in {operation}: {message}")]
    Decode { operation: &'static str, message: String },

    #[error("store lock poisoned")]
    Poisoned,
}

impl StoreError {
    pub(crate) fn missing_row(operation: &'static str, id: InventoryRowId) -> Self {
        StoreError::Missing {
            operation,
            message: format!("inventory row {id} does not exist"),
        }
    }
}

/// Point lookups and inserts for hubs.
#[async_trait]
pub trait HubStore: Send + Sync {
    async fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, StoreError>;
    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError>;
    async fn insert_hub(&self, hub: Hub) -> Result<Hub, StoreError>;
}

/// Point lookups and inserts for SKUs.
#[async_trait]
pub trait SkuStore: Send + Sync {
    async fn find_sku(&self, id: &SkuId) -> Result<Option<Sku>, StoreError>;
    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError>;
    async fn insert_sku(&self, sku: Sku) -> Result<Sku, StoreError>;
}

/// Inventory row access.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// First row (lowest row id) for the (sku, hub) pair.
    async fn find_inventory(&self, key: &InventoryKey) -> Result<Option<HubInventory>, StoreError>;

    /// Rewrite the whole row identified by `row.id`.
    ///
    /// No version check is performed: whatever was stored is overwritten. A
    /// row that no longer exists is reported as [`StoreError::Missing`].
    async fn save_inventory(&self, row: &HubInventory) -> Result<(), StoreError>;

    /// Set the quantity of `id` to `new_quantity` only if it still equals
    /// `expected`. Returns the number of rows affected (0 or 1).
    async fn update_quantity_if(
        &self,
        id: InventoryRowId,
        expected: i64,
        new_quantity: i64,
    ) -> Result<u64, StoreError>;

    /// Add a new row; the store assigns the row id.
    async fn insert_inventory(
        &self,
        key: InventoryKey,
        quantity: i64,
    ) -> Result<HubInventory, StoreError>;
}

#[async_trait]
impl<S> HubStore for Arc<S>
where
    S: HubStore + ?Sized,
{
    async fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        (**self).find_hub(id).await
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        (**self).list_hubs().await
    }

    async fn insert_hub(&self, hub: Hub) -> Result<Hub, StoreError> {
        (**self).insert_hub(hub).await
    }
}

#[async_trait]
impl<S> SkuStore for Arc<S>
where
    S: SkuStore + ?Sized,
{
    async fn find_sku(&self, id: &SkuId) -> Result<Option<Sku>, StoreError> {
        (**self).find_sku(id).await
    }

    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        (**self).list_skus().await
    }

    async fn insert_sku(&self, sku: Sku) -> Result<Sku, StoreError> {
        (**self).insert_sku(sku).await
    }
}

#[async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn find_inventory(&self, key: &InventoryKey) -> Result<Option<HubInventory>, StoreError> {
        (**self).find_inventory(key).await
    }

    async fn save_inventory(&self, row: &HubInventory) -> Result<(), StoreError> {
        (**self).save_inventory(row).await
    }

    async fn update_quantity_if(
        &self,
        id: InventoryRowId,
        expected: i64,
        new_quantity: i64,
    ) -> Result<u64, StoreError> {
        (**self).update_quantity_if(id, expected, new_quantity).await
    }

    async fn insert_inventory(
        &self,
        key: InventoryKey,
        quantity: i64,
    ) -> Result<HubInventory, StoreError> {
        (**self).insert_inventory(key, quantity).await
    }
}
