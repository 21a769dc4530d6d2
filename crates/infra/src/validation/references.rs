//! Hub + SKU existence validation for inbound orders.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use wms_core::{HubId, SkuId};

use super::scatter::{CheckAborted, ScatterGather, ValidationOutcome, Verdict};
use crate::store::{HubStore, SkuStore, StoreError};

/// Why a single reference lookup did not pass.
///
/// Both variants make the reference invalid; the split only changes the
/// message the caller sees.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupFailure {
    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reason attached to an invalid reference verdict. Always names one side.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("hub validation failed: {0}")]
    Hub(LookupFailure),

    #[error("sku validation failed: {0}")]
    Sku(LookupFailure),

    #[error("{label} validation failed: check aborted: {reason}")]
    Aborted { label: &'static str, reason: String },
}

impl ReferenceError {
    /// Which side failed: `"hub"` or `"sku"`.
    pub fn side(&self) -> &'static str {
        match self {
            ReferenceError::Hub(_) => HUB_CHECK,
            ReferenceError::Sku(_) => SKU_CHECK,
            ReferenceError::Aborted { label, .. } => *label,
        }
    }
}

impl From<CheckAborted> for ReferenceError {
    fn from(value: CheckAborted) -> Self {
        ReferenceError::Aborted {
            label: value.label,
            reason: value.reason,
        }
    }
}

const HUB_CHECK: &str = "hub";
const SKU_CHECK: &str = "sku";

/// Checks that the hub and SKU referenced by an order both exist.
///
/// The two lookups run concurrently on separate tasks; see
/// [`ScatterGather`] for how their outcomes are combined.
#[derive(Clone)]
pub struct ReferenceValidator {
    hubs: Arc<dyn HubStore>,
    skus: Arc<dyn SkuStore>,
}

impl ReferenceValidator {
    pub fn new(hubs: Arc<dyn HubStore>, skus: Arc<dyn SkuStore>) -> Self {
        Self { hubs, skus }
    }

    #[instrument(skip_all, fields(hub_id = %hub_id, sku_id = %sku_id))]
    pub async fn validate_references(&self, hub_id: &HubId, sku_id: &SkuId) -> Verdict<ReferenceError> {
        let hubs = self.hubs.clone();
        let hub_id = hub_id.clone();
        let skus = self.skus.clone();
        let sku_id = sku_id.clone();

        let verdict = ScatterGather::new()
            .check(HUB_CHECK, async move {
                match hubs.find_hub(&hub_id).await {
                    Ok(Some(_)) => ValidationOutcome::pass(),
                    Ok(None) => ValidationOutcome::fail(ReferenceError::Hub(LookupFailure::NotFound)),
                    Err(e) => ValidationOutcome::fail(ReferenceError::Hub(e.into())),
                }
            })
            .check(SKU_CHECK, async move {
                match skus.find_sku(&sku_id).await {
                    Ok(Some(_)) => ValidationOutcome::pass(),
                    Ok(None) => ValidationOutcome::fail(ReferenceError::Sku(LookupFailure::NotFound)),
                    Err(e) => ValidationOutcome::fail(ReferenceError::Sku(e.into())),
                }
            })
            .gather()
            .await;

        match verdict.reason() {
            None => info!("order references valid"),
            Some(reason) => info!(failed = reason.side(), %reason, "order references invalid"),
        }
        verdict
    }
}
