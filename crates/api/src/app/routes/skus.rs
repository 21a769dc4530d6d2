use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use wms_catalog::Sku;
use wms_core::SkuId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_skus).post(create_sku))
        .route("/:id", get(get_sku))
}

pub async fn list_skus(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.skus.list_skus().await {
        Ok(skus) if skus.is_empty() => errors::json_error(StatusCode::NOT_FOUND, "not_found", "No SKUs found"),
        Ok(skus) => (StatusCode::OK, Json(serde_json::json!({ "skus": skus }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let sku_id: SkuId = match dto::parse_id(&id, "sku") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.skus.find_sku(&sku_id).await {
        Ok(Some(sku)) => (StatusCode::OK, Json(serde_json::json!({ "sku": sku }))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "SKU not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_sku(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateSkuRequest>,
) -> axum::response::Response {
    let sku = match Sku::create(body.into(), Utc::now()) {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.skus.insert_sku(sku).await {
        Ok(sku) => {
            tracing::info!(sku_id = %sku.id, product_id = %sku.product_id, "sku created");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": "SKU created successfully",
                    "sku": sku,
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
