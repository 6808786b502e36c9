use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use flashdrop_core::DomainError;

/// Map a domain failure to a distinct, stable `{error, message}` response,
/// so a caller can programmatically tell "try again" from "this is final".
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        DomainError::SoldOut => json_error(StatusCode::CONFLICT, "sold_out", "item is sold out"),
        DomainError::Busy(msg) => json_error(StatusCode::SERVICE_UNAVAILABLE, "server_busy", msg),
        DomainError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        DomainError::Internal(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
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
