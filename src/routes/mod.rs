pub mod admin;
pub mod queue;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/queue", get(queue::status).post(queue::submit))
        .route("/api/reset", post(admin::reset))
}
