use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use wms_core::DomainError;
use wms_infra::store::StoreError;
use wms_infra::AdjustError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn adjust_error_to_response(err: AdjustError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        AdjustError::InvalidQuantity(_) => json_error(StatusCode::BAD_REQUEST, "invalid_quantity", message),
        AdjustError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "inventory_not_found", message),
        AdjustError::InsufficientQuantity { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_inventory", message)
        }
        AdjustError::Conflict => json_error(StatusCode::CONFLICT, "conflict", message),
        AdjustError::LookupFailed(_) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "lookup_failed", message),
        AdjustError::PersistFailure(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "update_failed", message)
        }
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ DomainError::InsufficientQuantity { .. } => {
            json_error(StatusCode::BAD_REQUEST, "insufficient_inventory", e.to_string())
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::error!(error = %err, "store operation failed");
    match err {
        StoreError::Conflict { .. } => json_error(StatusCode::CONFLICT, "conflict", err.to_string()),
        _ => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", err.to_string()),
    }
}
