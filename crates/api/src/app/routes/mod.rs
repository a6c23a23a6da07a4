use axum::{
    routing::{get, post, put},
    Router,
};

pub mod premium;
pub mod system;

/// Router for guild-scoped premium endpoints (mounted under `/guilds`).
pub fn router() -> Router {
    Router::new()
        .route("/:id", put(premium::register_guild))
        .route("/:id/premium", get(premium::get_premium))
        .route("/:id/premium/transfer/:dest", post(premium::transfer_premium))
        .route("/:id/premium/subservers/:dest", post(premium::add_gold_subserver))
}
