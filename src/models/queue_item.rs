use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// One unit of publishable work: an article to render into a promo video
/// and (unless `skip_post`) attach as a reply to `reply_to_url`.
///
/// Status only moves forward: pending -> processing -> completed | failed.
/// `scheduled_time` is assigned once at admission and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItem {
    pub id: Uuid,
    pub article_url: String,
    pub reply_to_url: String,
    pub wpm: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    pub account: String,
    #[serde(default)]
    pub skip_post: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precomputed_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precomputed_content: Option<String>,
    pub scheduled_time: i64,
    pub status: ItemStatus,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted: Option<bool>,
}

impl QueueItem {
    /// Timestamp the slot allocator keys off: completion time for completed
    /// items, scheduled time for pending/processing, nothing for failed.
    pub fn relevant_time(&self) -> Option<i64> {
        match self.status {
            ItemStatus::Completed => Some(self.completed_at.unwrap_or(self.scheduled_time)),
            ItemStatus::Pending | ItemStatus::Processing => Some(self.scheduled_time),
            ItemStatus::Failed => None,
        }
    }

    /// Timestamp used for the daily-cap window: completion time if set,
    /// otherwise the scheduled slot.
    pub fn effective_time(&self) -> i64 {
        self.completed_at.unwrap_or(self.scheduled_time)
    }

    /// Failed items never count against an account's daily cap.
    pub fn counts_toward_cap(&self) -> bool {
        self.status != ItemStatus::Failed
    }
}
