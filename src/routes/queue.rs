use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::scheduler::{EnqueueRequest, QueueSnapshot};
use crate::state::SharedState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub article_url: Option<String>,
    pub reply_to_url: Option<String>,
    pub wpm: Option<u32>,
    pub template: Option<String>,
    pub account: Option<String>,
    #[serde(default)]
    pub skip_post: bool,
    pub precomputed_title: Option<String>,
    pub precomputed_content: Option<String>,
}

pub async fn submit(
    State(state): State<SharedState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let article_url = req
        .article_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("articleUrl is required".to_string()))?;

    let admitted = state
        .scheduler
        .enqueue(EnqueueRequest {
            article_url,
            reply_to_url: req.reply_to_url,
            wpm: req.wpm,
            template: req.template,
            account: req.account,
            skip_post: req.skip_post,
            precomputed_title: req.precomputed_title,
            precomputed_content: req.precomputed_content,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "queueItem": admitted,
    })))
}

pub async fn status(State(state): State<SharedState>) -> Json<QueueSnapshot> {
    Json(state.scheduler.snapshot().await)
}
