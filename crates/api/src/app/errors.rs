use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tierlink_infra::{StoreError, TransferError};

pub fn transfer_error_to_response(err: TransferError) -> axum::response::Response {
    match err {
        TransferError::MalformedIdentifier(msg) => {
            json_error(StatusCode::BAD_REQUEST, "malformed_identifier", msg)
        }
        TransferError::MissingRecord(id) => json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no entitlement record for guild {id}"),
        ),
        TransferError::Rejected(reason) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, reason.code(), reason.to_string())
        }
        TransferError::Store(StoreError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        TransferError::Store(e) => {
            tracing::error!(error = %e, "entitlement store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
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
