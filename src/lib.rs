pub mod config;
pub mod error;
pub mod state;
pub mod models;
pub mod timeutil;
pub mod store;
pub mod ledger;
pub mod scheduler;
pub mod pipeline;
pub mod sweeper;
pub mod routes;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

pub fn build_app(state: SharedState) -> Router {
    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
