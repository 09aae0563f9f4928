use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::state::SharedState;

/// Both flags default to true: a bare `POST /reset {}` wipes everything,
/// while either flag can be set false to keep that half.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetRequest {
    pub clear_queues: bool,
    pub clear_ledger: bool,
}

impl Default for ResetRequest {
    fn default() -> Self {
        Self {
            clear_queues: true,
            clear_ledger: true,
        }
    }
}

pub async fn reset(
    State(state): State<SharedState>,
    body: Option<Json<ResetRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    // A bare POST with no body is a full reset.
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let actions = state
        .scheduler
        .reset(req.clear_queues, req.clear_ledger)
        .await;

    Ok(Json(json!({ "actions": actions })))
}
