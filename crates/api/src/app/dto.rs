use std::str::FromStr;

use axum::http::StatusCode;
use serde::Deserialize;

use wms_catalog::{NewHub, NewSku};
use wms_core::{DomainError, ProductId, TenantId};
use wms_inventory::HubInventory;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ValidateOrderRequest {
    pub hub_id: String,
    pub sku_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateInventoryRequest {
    pub sku_id: String,
    pub hub_id: String,
    pub quantity_ordered: i64,
}

/// Missing manager fields deserialize as empty so the domain rule reports them.
#[derive(Debug, Deserialize)]
pub struct CreateHubRequest {
    #[serde(default)]
    pub tenant_id: u64,
    #[serde(default)]
    pub manager_name: String,
    #[serde(default)]
    pub manager_contact: Option<String>,
    #[serde(default)]
    pub manager_email: String,
}

impl From<CreateHubRequest> for NewHub {
    fn from(body: CreateHubRequest) -> Self {
        NewHub {
            tenant_id: TenantId::new(body.tenant_id),
            manager_name: body.manager_name,
            manager_contact: body.manager_contact,
            manager_email: body.manager_email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSkuRequest {
    #[serde(default)]
    pub product_id: u64,
}

impl From<CreateSkuRequest> for NewSku {
    fn from(body: CreateSkuRequest) -> Self {
        NewSku {
            product_id: ProductId::new(body.product_id),
        }
    }
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse an identifier from a path segment or request field.
pub fn parse_id<T>(raw: &str, what: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}

pub fn inventory_to_json(row: &HubInventory) -> serde_json::Value {
    serde_json::json!({
        "id": row.id,
        "sku_id": row.sku_id,
        "hub_id": row.hub_id,
        "quantity_of_each_product": row.quantity,
    })
}
