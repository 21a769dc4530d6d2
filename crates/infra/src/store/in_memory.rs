use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use wms_catalog::{Hub, Sku};
use wms_core::{HubId, SkuId};
use wms_inventory::{HubInventory, InventoryKey, InventoryRowId};

use super::{HubStore, InventoryStore, SkuStore, StoreError};

/// In-memory warehouse store for tests/dev.
///
/// Inventory rows are kept ordered by row id so that lookups return the first
/// match, the same way the SQL store does.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    hubs: RwLock<HashMap<HubId, Hub>>,
    skus: RwLock<HashMap<SkuId, Sku>>,
    inventory: RwLock<BTreeMap<InventoryRowId, HubInventory>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HubStore for InMemoryWarehouseStore {
    async fn find_hub(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        let map = self.hubs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn list_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        let map = self.hubs.read().map_err(|_| StoreError::Poisoned)?;
        let mut hubs: Vec<Hub> = map.values().cloned().collect();
        hubs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(hubs)
    }

    async fn insert_hub(&self, hub: Hub) -> Result<Hub, StoreError> {
        let mut map = self.hubs.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&hub.id) {
            return Err(StoreError::Conflict {
                operation: "insert_hub",
                message: format!("hub {} already exists", hub.id),
            });
        }
        map.insert(hub.id.clone(), hub.clone());
        Ok(hub)
    }
}

#[async_trait]
impl SkuStore for InMemoryWarehouseStore {
    async fn find_sku(&self, id: &SkuId) -> Result<Option<Sku>, StoreError> {
        let map = self.skus.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    async fn list_skus(&self) -> Result<Vec<Sku>, StoreError> {
        let map = self.skus.read().map_err(|_| StoreError::Poisoned)?;
        let mut skus: Vec<Sku> = map.values().cloned().collect();
        skus.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(skus)
    }

    async fn insert_sku(&self, sku: Sku) -> Result<Sku, StoreError> {
        let mut map = self.skus.write().map_err(|_| StoreError::Poisoned)?;
        if map.contains_key(&sku.id) {
            return Err(StoreError::Conflict {
                operation: "insert_sku",
                message: format!("sku {} already exists", sku.id),
            });
        }
        map.insert(sku.id.clone(), sku.clone());
        Ok(sku)
    }
}

#[async_trait]
impl InventoryStore for InMemoryWarehouseStore {
    async fn find_inventory(&self, key: &InventoryKey) -> Result<Option<HubInventory>, StoreError> {
        let rows = self.inventory.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows.values().find(|r| r.matches(key)).cloned())
    }

    async fn save_inventory(&self, row: &HubInventory) -> Result<(), StoreError> {
        let mut rows = self.inventory.write().map_err(|_| StoreError::Poisoned)?;
        match rows.get_mut(&row.id) {
            Some(stored) => {
                *stored = row.clone();
                Ok(())
            }
            None => Err(StoreError::missing_row("save_inventory", row.id)),
        }
    }

    async fn update_quantity_if(
        &self,
        id: InventoryRowId,
        expected: i64,
        new_quantity: i64,
    ) -> Result<u64, StoreError> {
        let mut rows = self.inventory.write().map_err(|_| StoreError::Poisoned)?;
        match rows.get_mut(&id) {
            Some(row) if row.quantity == expected => {
                row.quantity = new_quantity;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn insert_inventory(
        &self,
        key: InventoryKey,
        quantity: i64,
    ) -> Result<HubInventory, StoreError> {
        let mut rows = self.inventory.write().map_err(|_| StoreError::Poisoned)?;
        let next = rows.keys().next_back().map_or(1, |id| id.0 + 1);
        let row = HubInventory {
            id: InventoryRowId(next),
            sku_id: key.sku_id,
            hub_id: key.hub_id,
            quantity,
        };
        rows.insert(row.id, row.clone());
        Ok(row)
    }
}
