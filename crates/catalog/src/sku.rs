use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wms_core::{DomainError, DomainResult, ProductId, SkuId};

/// A stock-keeping unit: one sellable variant of a catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    pub id: SkuId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a SKU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSku {
    pub product_id: ProductId,
}

impl Sku {
    pub fn create(input: NewSku, now: DateTime<Utc>) -> DomainResult<Self> {
        Self::create_with_id(SkuId::generate(), input, now)
    }

    pub fn create_with_id(id: SkuId, input: NewSku, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.product_id.is_zero() {
            return Err(DomainError::validation("product id is required"));
        }
        Ok(Self {
            id,
            product_id: input.product_id,
            created_at: now,
        })
    }
}
