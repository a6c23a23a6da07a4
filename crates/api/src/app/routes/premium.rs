use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::app::{dto, errors, PremiumService};

pub async fn get_premium(
    Extension(service): Extension<Arc<PremiumService>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    match service.lookup(&id).await {
        Ok(premium) => (StatusCode::OK, Json(dto::premium_to_json(&premium))).into_response(),
        Err(e) => errors::transfer_error_to_response(e),
    }
}

pub async fn register_guild(
    Extension(service): Extension<Arc<PremiumService>>,
    Path(id): Path<String>,
    body: Option<Json<dto::RegisterGuildRequest>>,
) -> axum::response::Response {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    match service.register(&id, body.name.as_deref()).await {
        Ok(record) => (StatusCode::OK, Json(dto::record_to_json(&record))).into_response(),
        Err(e) => errors::transfer_error_to_response(e),
    }
}

pub async fn transfer_premium(
    Extension(service): Extension<Arc<PremiumService>>,
    Path((origin, dest)): Path<(String, String)>,
) -> axum::response::Response {
    match service.transfer(&origin, &dest).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "transferred",
                "origin": origin,
                "dest": dest,
            })),
        )
            .into_response(),
        Err(e) => errors::transfer_error_to_response(e),
    }
}

pub async fn add_gold_subserver(
    Extension(service): Extension<Arc<PremiumService>>,
    Path((origin, dest)): Path<(String, String)>,
) -> axum::response::Response {
    match service.grant(&origin, &dest).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "granted",
                "origin": origin,
                "dest": dest,
            })),
        )
            .into_response(),
        Err(e) => errors::transfer_error_to_response(e),
    }
}
