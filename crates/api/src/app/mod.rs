//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and `TransferService` construction
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::PremiumService;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(service: Arc<PremiumService>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/guilds", routes::router())
        .layer(Extension(service))
}
