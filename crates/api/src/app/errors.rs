use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use catalog_infra::{ServiceError, StorageError};

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::InvalidArgument(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_argument", msg)
        }
        ServiceError::ValidationFailed(errors) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": errors.joined(", "),
                "errors": errors.errors(),
            })),
        )
            .into_response(),
        ServiceError::Storage(e) => {
            tracing::error!(error = %e, "storage failure");
            match e {
                StorageError::Unavailable(msg) => {
                    json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
                }
                StorageError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
                other => json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_error",
                    other.to_string(),
                ),
            }
        }
    }
}

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
