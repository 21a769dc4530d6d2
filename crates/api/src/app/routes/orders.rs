use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};

use wms_core::{HubId, SkuId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/validate_order", post(validate_order))
        .route("/validate_inventory", post(validate_inventory))
}

/// Check that both the hub and the SKU of an order exist.
pub async fn validate_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ValidateOrderRequest>,
) -> axum::response::Response {
    let hub_id: HubId = match dto::parse_id(&body.hub_id, "hub") {
        Ok(v) => v,
        Err(res) => return res,
    };
    let sku_id: SkuId = match dto::parse_id(&body.sku_id, "sku") {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.validator.validate_references(&hub_id, &sku_id).await.into_result() {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Validation successful" })),
        )
            .into_response(),
        Err(reason) => errors::json_error(StatusCode::BAD_REQUEST, "validation_failed", reason.to_string()),
    }
}

/// Deduct the ordered quantity from the hub's stock of the SKU.
pub async fn validate_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ValidateInventoryRequest>,
) -> axum::response::Response {
    let sku_id: SkuId = match dto::parse_id(&body.sku_id, "sku") {
        Ok(v) => v,
        Err(res) => return res,
    };
    let hub_id: HubId = match dto::parse_id(&body.hub_id, "hub") {
        Ok(v) => v,
        Err(res) => return res,
    };

    match services.adjuster.adjust(&sku_id, &hub_id, body.quantity_ordered).await {
        Ok(row) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Inventory validation and update successful",
                "inventory": dto::inventory_to_json(&row),
            })),
        )
            .into_response(),
        Err(e) => errors::adjust_error_to_response(e),
    }
}
