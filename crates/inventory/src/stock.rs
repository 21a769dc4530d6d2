use serde::{Deserialize, Serialize};

use wms_core::{DomainError, DomainResult, HubId, SkuId};

/// Surrogate row identifier assigned by the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryRowId(pub i64);

impl core::fmt::Display for InventoryRowId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Composite lookup key of an inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub sku_id: SkuId,
    pub hub_id: HubId,
}

impl InventoryKey {
    pub fn new(sku_id: SkuId, hub_id: HubId) -> Self {
        Self { sku_id, hub_id }
    }
}

/// On-hand quantity of one SKU at one hub.
///
/// One row per (sku, hub) is assumed but not enforced; lookups take the first
/// match by row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubInventory {
    pub id: InventoryRowId,
    pub sku_id: SkuId,
    pub hub_id: HubId,
    pub quantity: i64,
}

impl HubInventory {
    pub fn key(&self) -> InventoryKey {
        InventoryKey::new(self.sku_id.clone(), self.hub_id.clone())
    }

    pub fn matches(&self, key: &InventoryKey) -> bool {
        self.sku_id == key.sku_id && self.hub_id == key.hub_id
    }

    /// Remove `requested` units from this row.
    ///
    /// Rejects negative requests and requests larger than the on-hand quantity;
    /// on error the row is left untouched. Returns the new quantity.
    pub fn deduct(&mut self, requested: i64) -> DomainResult<i64> {
        if requested < 0 {
            return Err(DomainError::validation("quantity ordered cannot be negative"));
        }
        if requested > self.quantity {
            return Err(DomainError::insufficient(requested, self.quantity));
        }
        self.quantity -= requested;
        Ok(self.quantity)
    }
}
