use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use wms_catalog::Hub;
use wms_core::HubId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_hubs).post(create_hub))
        .route("/:id", get(get_hub))
}

pub async fn list_hubs(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.hubs.list_hubs().await {
        Ok(hubs) if hubs.is_empty() => errors::json_error(StatusCode::NOT_FOUND, "not_found", "No hubs found"),
        Ok(hubs) => (StatusCode::OK, Json(serde_json::json!({ "hubs": hubs }))).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_hub(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let hub_id: HubId = match dto::parse_id(&id, "hub") {
        Ok(v) => v,
        Err(res) => return res,
    };
    match services.hubs.find_hub(&hub_id).await {
        Ok(Some(hub)) => (StatusCode::OK, Json(serde_json::json!({ "hub": hub }))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "Hub not found"),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_hub(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateHubRequest>,
) -> axum::response::Response {
    let hub = match Hub::create(body.into(), Utc::now()) {
        Ok(h) => h,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.hubs.insert_hub(hub).await {
        Ok(hub) => {
            tracing::info!(hub_id = %hub.id, "hub created");
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "message": "Hub created successfully",
                    "hub": hub,
                })),
            )
                .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
