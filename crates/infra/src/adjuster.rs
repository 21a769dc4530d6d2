//! Read-check-write stock decrement for a (sku, hub) pair.
//!
//! ```text
//! requested
//!   ↓
//! 1. Reject negative quantities (no lookup)
//!   ↓
//! 2. Load the first inventory row for (sku, hub)
//!   ↓
//! 3. HubInventory::deduct (pure rule, leaves the row intact on error)
//!   ↓
//! 4. Persist according to the configured AdjustPolicy
//! ```
//!
//! Under [`AdjustPolicy::LastWriteWins`] nothing serializes two adjustments of
//! the same row: both may read the same quantity and the later save wins.
//! [`AdjustPolicy::Conditional`] turns that interleaving into
//! [`AdjustError::Conflict`] for the loser. Neither policy retries.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument, warn};

use wms_core::{DomainError, HubId, SkuId};
use wms_inventory::{HubInventory, InventoryKey};

use crate::store::{InventoryStore, StoreError};

/// How the decremented quantity is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdjustPolicy {
    /// Full-row save with no check of what is currently stored.
    #[default]
    LastWriteWins,
    /// Write only if the stored quantity still equals the value that was read.
    Conditional,
}

impl AdjustPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustPolicy::LastWriteWins => "last-write-wins",
            AdjustPolicy::Conditional => "conditional",
        }
    }
}

impl core::fmt::Display for AdjustPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown inventory adjust policy '{0}' (expected 'last-write-wins' or 'conditional')")]
pub struct UnknownPolicy(pub String);

impl FromStr for AdjustPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-write-wins" | "last_write_wins" | "lww" => Ok(AdjustPolicy::LastWriteWins),
            "conditional" | "cas" => Ok(AdjustPolicy::Conditional),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AdjustError {
    #[error("quantity ordered cannot be negative (got {0})")]
    InvalidQuantity(i64),

    #[error("inventory not found for sku {sku_id} at hub {hub_id}")]
    NotFound { sku_id: SkuId, hub_id: HubId },

    #[error("inventory lookup failed: {0}")]
    LookupFailed(StoreError),

    #[error("insufficient inventory: requested {requested}, available {available}")]
    InsufficientQuantity { requested: i64, available: i64 },

    /// The row changed between read and write (conditional policy only).
    #[error("inventory changed concurrently; nothing was written")]
    Conflict,

    /// The write failed; whether it reached storage is unknown.
    #[error("failed to update inventory: {0}")]
    PersistFailure(StoreError),
}

#[derive(Clone)]
pub struct InventoryAdjuster {
    store: Arc<dyn InventoryStore>,
    policy: AdjustPolicy,
}

impl InventoryAdjuster {
    pub fn new(store: Arc<dyn InventoryStore>, policy: AdjustPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> AdjustPolicy {
        self.policy
    }

    /// Deduct `requested` units of `sku_id` at `hub_id` and return the
    /// updated row.
    #[instrument(
        skip_all,
        fields(sku_id = %sku_id, hub_id = %hub_id, requested = requested, policy = %self.policy),
        err(Display)
    )]
    pub async fn adjust(
        &self,
        sku_id: &SkuId,
        hub_id: &HubId,
        requested: i64,
    ) -> Result<HubInventory, AdjustError> {
        if requested < 0 {
            return Err(AdjustError::InvalidQuantity(requested));
        }

        let key = InventoryKey::new(sku_id.clone(), hub_id.clone());
        let mut row = self
            .store
            .find_inventory(&key)
            .await
            .map_err(AdjustError::LookupFailed)?
            .ok_or_else(|| AdjustError::NotFound {
                sku_id: sku_id.clone(),
                hub_id: hub_id.clone(),
            })?;

        let read_quantity = row.quantity;
        row.deduct(requested).map_err(|e| match e {
            DomainError::InsufficientQuantity { requested, available } => {
                AdjustError::InsufficientQuantity { requested, available }
            }
            _ => AdjustError::InvalidQuantity(requested),
        })?;

        match self.policy {
            AdjustPolicy::LastWriteWins => {
                self.store
                    .save_inventory(&row)
                    .await
                    .map_err(AdjustError::PersistFailure)?;
            }
            AdjustPolicy::Conditional => {
                let affected = self
                    .store
                    .update_quantity_if(row.id, read_quantity, row.quantity)
                    .await
                    .map_err(AdjustError::PersistFailure)?;
                if affected == 0 {
                    warn!(row_id = %row.id, read_quantity, "inventory row changed under us");
                    return Err(AdjustError::Conflict);
                }
            }
        }

        info!(row_id = %row.id, remaining = row.quantity, "inventory adjusted");
        Ok(row)
    }
}
