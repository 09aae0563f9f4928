use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{AccountConfig, Config};
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::models::{ItemStatus, QueueItem};
use crate::pipeline::{Article, Pipeline};
use crate::store::QueueStore;
use crate::timeutil::{normalize_url, now_ms, same_local_day};

/// An admission request, already shaped by the HTTP layer.
#[derive(Debug, Clone)]
pub struct EnqueueRequest {
    pub article_url: String,
    pub reply_to_url: Option<String>,
    pub wpm: Option<u32>,
    pub template: Option<String>,
    /// `None` or `"auto"` asks the router to pick an account.
    pub account: Option<String>,
    pub skip_post: bool,
    pub precomputed_title: Option<String>,
    pub precomputed_content: Option<String>,
}

/// What admission reports back to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Admitted {
    pub id: Uuid,
    pub account: String,
    pub scheduled_time: i64,
    pub queue_position: usize,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    fn bump(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Pending => self.pending += 1,
            ItemStatus::Processing => self.processing += 1,
            ItemStatus::Completed => self.completed += 1,
            ItemStatus::Failed => self.failed += 1,
        }
    }

    fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountCounts {
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub id: Uuid,
    pub account: String,
    pub status: ItemStatus,
    pub article_url: String,
    pub scheduled_time: i64,
    pub created_at: i64,
    /// Distinguishes "rendered but not shared" from fully published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted: Option<bool>,
}

/// Aggregate view of every account's queue, for the status endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub counts: StatusCounts,
    pub accounts: BTreeMap<String, AccountCounts>,
    pub items: Vec<ItemSummary>,
}

struct SchedulerState {
    queues: HashMap<String, Vec<QueueItem>>,
    ledger: Ledger,
}

/// Owns every account queue and the processed-content ledger. Both the HTTP
/// admission path and the sweeper drive it through `&self`; all queue state
/// sits behind one async mutex, and the sweep itself is additionally
/// single-flight.
pub struct Scheduler {
    accounts: Vec<AccountConfig>,
    min_spacing_ms: i64,
    store: QueueStore,
    state: Mutex<SchedulerState>,
    sweeping: AtomicBool,
}

impl Scheduler {
    /// Load persisted queues and the ledger for every configured account.
    pub async fn load(config: &Config) -> Self {
        let store = QueueStore::new(config.data_dir.clone());

        let mut queues = HashMap::new();
        for account in &config.accounts {
            let items = store.load(&account.name).await;
            if !items.is_empty() {
                tracing::info!(
                    "Loaded {} queued item(s) for account '{}'",
                    items.len(),
                    account.name
                );
            }
            queues.insert(account.name.clone(), items);
        }

        let ledger = Ledger::load(&config.data_dir).await;
        if !ledger.is_empty() {
            tracing::info!("Loaded {} processed-content entries", ledger.len());
        }

        Self {
            accounts: config.accounts.clone(),
            min_spacing_ms: config.min_spacing_ms,
            store,
            state: Mutex::new(SchedulerState { queues, ledger }),
            sweeping: AtomicBool::new(false),
        }
    }

    // ── Admission ───────────────────────────────────────────────────

    /// Admit one publish request: duplicate guard, account routing, slot
    /// allocation, append, persist.
    pub async fn enqueue(&self, req: EnqueueRequest) -> Result<Admitted, AppError> {
        if req.article_url.trim().is_empty() {
            return Err(AppError::BadRequest("articleUrl is required".to_string()));
        }

        let reply_to_url = req
            .reply_to_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| req.article_url.clone());

        let norm_article = normalize_url(&req.article_url);
        let norm_reply = normalize_url(&reply_to_url);

        let mut state = self.state.lock().await;

        if let Some(message) = find_duplicate(&state, &norm_article, &norm_reply) {
            return Err(AppError::Duplicate(message));
        }

        let now = now_ms();
        let account = self.route(&state, req.account.as_deref(), now)?;

        let queue = state
            .queues
            .get_mut(&account)
            .ok_or_else(|| AppError::Internal(format!("No queue for account '{account}'")))?;

        let scheduled_time = next_slot(queue, self.min_spacing_ms, now);

        let item = QueueItem {
            id: Uuid::now_v7(),
            article_url: req.article_url,
            reply_to_url,
            wpm: req.wpm.unwrap_or(400),
            template: req.template,
            account: account.clone(),
            skip_post: req.skip_post,
            precomputed_title: req.precomputed_title,
            precomputed_content: req.precomputed_content,
            scheduled_time,
            status: ItemStatus::Pending,
            created_at: now,
            completed_at: None,
            failed_at: None,
            error: None,
            video_path: None,
            posted: None,
        };

        let admitted = Admitted {
            id: item.id,
            account: account.clone(),
            scheduled_time,
            queue_position: queue.len() + 1,
        };

        tracing::info!(
            "Queued {} on '{}' at slot {} (position {})",
            admitted.id,
            admitted.account,
            admitted.scheduled_time,
            admitted.queue_position
        );

        queue.push(item);
        self.store.save(&account, queue).await;

        Ok(admitted)
    }

    /// Resolve the target account for an admission request.
    ///
    /// `auto` picks the in-consideration account with the earliest next
    /// slot, ties broken by configuration order. Capped accounts leave
    /// consideration once today's submissions reach their cap; a capped
    /// account named explicitly while at cap is silently reassigned to the
    /// overflow account.
    fn route(
        &self,
        state: &SchedulerState,
        requested: Option<&str>,
        now: i64,
    ) -> Result<String, AppError> {
        match requested {
            None | Some("auto") | Some("") => {
                let mut best: Option<(i64, &str)> = None;

                for account in &self.accounts {
                    let queue = match state.queues.get(&account.name) {
                        Some(q) => q,
                        None => continue,
                    };

                    if let Some(cap) = account.daily_cap {
                        if count_today(queue, now) >= cap {
                            continue;
                        }
                    }

                    let slot = next_slot(queue, self.min_spacing_ms, now);
                    if best.is_none_or(|(best_slot, _)| slot < best_slot) {
                        best = Some((slot, &account.name));
                    }
                }

                // The overflow account is never excluded, so this always picks one.
                best.map(|(_, name)| name.to_string())
                    .ok_or_else(|| AppError::Internal("No account available".to_string()))
            }
            Some(name) => {
                let account = self
                    .accounts
                    .iter()
                    .find(|a| a.name == name)
                    .ok_or_else(|| AppError::BadRequest(format!("Unknown account: {name}")))?;

                if let Some(cap) = account.daily_cap {
                    let queue = state.queues.get(&account.name);
                    if queue.is_some_and(|q| count_today(q, now) >= cap) {
                        let overflow = self.overflow_account().ok_or_else(|| {
                            AppError::Internal("No overflow account configured".to_string())
                        })?;
                        tracing::info!(
                            "Account '{name}' at daily cap, reassigning to '{overflow}'"
                        );
                        return Ok(overflow.to_string());
                    }
                }

                Ok(account.name.clone())
            }
        }
    }

    /// The single uncapped account. `Config::from_env` guarantees one
    /// exists, but a hand-built Config may not, so callers surface `None`
    /// as an error instead of routing to a phantom account.
    fn overflow_account(&self) -> Option<&str> {
        self.accounts
            .iter()
            .find(|a| a.daily_cap.is_none())
            .map(|a| a.name.as_str())
    }

    // ── Sweep ───────────────────────────────────────────────────────

    /// One pass of the queue processor: pick up every due pending item and
    /// drive it through extract -> render -> post. A sweep started while
    /// another one is in flight is a no-op, so a slow render can never
    /// cause the same item to be picked up twice.
    pub async fn sweep(&self, pipeline: &Pipeline) {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Sweep already in progress, skipping");
            return;
        }

        let now = now_ms();
        let due: Vec<(String, Uuid)> = {
            let state = self.state.lock().await;
            self.accounts
                .iter()
                .filter_map(|account| state.queues.get(&account.name))
                .flatten()
                .filter(|item| item.status == ItemStatus::Pending && item.scheduled_time <= now)
                .map(|item| (item.account.clone(), item.id))
                .collect()
        };

        if !due.is_empty() {
            tracing::info!("Sweep picked up {} due item(s)", due.len());
        }

        for (account, id) in due {
            self.process_item(pipeline, &account, id).await;
        }

        self.sweeping.store(false, Ordering::SeqCst);
    }

    /// Drive a single due item through the pipeline. Render-path errors are
    /// terminal for the item; publish errors only clear its `posted` flag.
    /// Nothing here propagates, so one bad item never stalls the sweep.
    async fn process_item(&self, pipeline: &Pipeline, account: &str, id: Uuid) {
        // Mark processing and persist before any external call, so a crash
        // mid-render is visible as `processing` after restart.
        let snapshot = {
            let mut state = self.state.lock().await;
            let Some(queue) = state.queues.get_mut(account) else {
                return;
            };
            let Some(item) = queue.iter_mut().find(|i| i.id == id) else {
                // Queue was reset while the sweep held the item's id.
                return;
            };
            if item.status != ItemStatus::Pending {
                return;
            }

            item.status = ItemStatus::Processing;
            let snapshot = item.clone();
            self.store.save(account, queue).await;
            snapshot
        };

        tracing::info!("Processing {} ({})", id, snapshot.article_url);

        // The state lock is NOT held across the collaborator calls below;
        // admissions interleave freely with an in-flight render.
        let article = match resolve_content(pipeline, &snapshot).await {
            Ok(article) => article,
            Err(e) => {
                tracing::error!("Item {} failed: {e}", id);
                self.finish_failed(account, id, e.to_string()).await;
                return;
            }
        };

        let video_path = match pipeline
            .renderer
            .render(&article, snapshot.wpm, snapshot.template.as_deref())
            .await
        {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("Item {} failed to render: {e}", id);
                self.finish_failed(account, id, e.to_string()).await;
                return;
            }
        };

        let posted = if snapshot.skip_post {
            false
        } else {
            match pipeline
                .publisher
                .publish(&video_path, &snapshot.reply_to_url, account)
                .await
            {
                Ok(()) => true,
                Err(e) => {
                    // The render succeeded; the item still completes.
                    tracing::warn!("Item {} rendered but failed to post: {e}", id);
                    false
                }
            }
        };

        self.finish_completed(account, id, &snapshot, video_path, posted)
            .await;
    }

    async fn finish_failed(&self, account: &str, id: Uuid, error: String) {
        let mut state = self.state.lock().await;
        let Some(queue) = state.queues.get_mut(account) else {
            return;
        };
        let Some(item) = queue.iter_mut().find(|i| i.id == id) else {
            return;
        };

        item.status = ItemStatus::Failed;
        item.failed_at = Some(now_ms());
        item.error = Some(error);
        self.store.save(account, queue).await;
    }

    async fn finish_completed(
        &self,
        account: &str,
        id: Uuid,
        snapshot: &QueueItem,
        video_path: String,
        posted: bool,
    ) {
        let mut state = self.state.lock().await;

        // Record the content as handled before completing the item, so the
        // duplicate guard keeps rejecting it even after a queue reset.
        let norm_article = normalize_url(&snapshot.article_url);
        let norm_reply = normalize_url(&snapshot.reply_to_url);
        state.ledger.record(norm_article.clone());
        if norm_reply != norm_article {
            state.ledger.record(norm_reply);
        }
        state.ledger.save().await;

        let Some(queue) = state.queues.get_mut(account) else {
            return;
        };
        let Some(item) = queue.iter_mut().find(|i| i.id == id) else {
            return;
        };

        item.status = ItemStatus::Completed;
        item.completed_at = Some(now_ms());
        item.video_path = Some(video_path);
        item.posted = Some(posted);
        self.store.save(account, queue).await;

        tracing::info!("Item {} completed (posted: {posted})", id);
    }

    // ── Inspection & administration ─────────────────────────────────

    /// Aggregate counts plus a flattened item listing across all accounts,
    /// ordered by scheduled time.
    pub async fn snapshot(&self) -> QueueSnapshot {
        let state = self.state.lock().await;

        let mut counts = StatusCounts::default();
        let mut accounts = BTreeMap::new();
        let mut items = Vec::new();

        for account in &self.accounts {
            let queue = state.queues.get(&account.name);
            let mut per_account = StatusCounts::default();

            for item in queue.into_iter().flatten() {
                counts.bump(item.status);
                per_account.bump(item.status);
                items.push(ItemSummary {
                    id: item.id,
                    account: item.account.clone(),
                    status: item.status,
                    article_url: item.article_url.clone(),
                    scheduled_time: item.scheduled_time,
                    created_at: item.created_at,
                    posted: item.posted,
                });
            }

            accounts.insert(
                account.name.clone(),
                AccountCounts {
                    total: per_account.total(),
                    counts: per_account,
                },
            );
        }

        items.sort_by_key(|i| i.scheduled_time);

        QueueSnapshot {
            counts,
            accounts,
            items,
        }
    }

    /// Full copy of one account's queue, in admission order.
    pub async fn items(&self, account: &str) -> Vec<QueueItem> {
        let state = self.state.lock().await;
        state.queues.get(account).cloned().unwrap_or_default()
    }

    /// Administrative reset. Returns a description of each action taken.
    pub async fn reset(&self, clear_queues: bool, clear_ledger: bool) -> Vec<String> {
        let mut actions = Vec::new();
        let mut state = self.state.lock().await;

        if clear_queues {
            for account in &self.accounts {
                if let Some(queue) = state.queues.get_mut(&account.name) {
                    let dropped = queue.len();
                    queue.clear();
                    self.store.save(&account.name, queue).await;
                    actions.push(format!(
                        "Cleared queue for account '{}' ({dropped} item(s))",
                        account.name
                    ));
                }
            }
        }

        if clear_ledger {
            let dropped = state.ledger.len();
            state.ledger.clear();
            state.ledger.save().await;
            actions.push(format!(
                "Cleared processed-content ledger ({dropped} entry(ies))"
            ));
        }

        for action in &actions {
            tracing::info!("{action}");
        }

        actions
    }
}

// ── Pure queue logic ────────────────────────────────────────────────

/// Earliest legal slot for a new item in `queue`: the latest relevant
/// timestamp plus the minimum spacing, floored at `now`. An idle queue
/// collapses to `now`.
fn next_slot(queue: &[QueueItem], min_spacing_ms: i64, now: i64) -> i64 {
    match queue.iter().filter_map(QueueItem::relevant_time).max() {
        Some(latest) => (latest + min_spacing_ms).max(now),
        None => now,
    }
}

/// Submissions counted against an account's cap for the current local
/// calendar day. Failed items never count.
fn count_today(queue: &[QueueItem], now: i64) -> u32 {
    queue
        .iter()
        .filter(|item| item.counts_toward_cap() && same_local_day(item.effective_time(), now))
        .count() as u32
}

/// Account-agnostic duplicate check: the normalized article URL and reply
/// target are compared against the corresponding fields of every item in
/// every queue, and against the processed-content ledger.
fn find_duplicate(
    state: &SchedulerState,
    norm_article: &str,
    norm_reply: &str,
) -> Option<String> {
    for (account, queue) in &state.queues {
        for item in queue {
            if normalize_url(&item.article_url) == norm_article {
                return Some(format!("Article already queued on account '{account}'"));
            }
            if normalize_url(&item.reply_to_url) == norm_reply {
                return Some(format!(
                    "Reply target already queued on account '{account}'"
                ));
            }
        }
    }

    if state.ledger.contains(norm_article) || state.ledger.contains(norm_reply) {
        return Some("Content already processed".to_string());
    }

    None
}

async fn resolve_content(
    pipeline: &Pipeline,
    item: &QueueItem,
) -> Result<Article, crate::pipeline::PipelineError> {
    if let Some(content) = &item.precomputed_content {
        return Ok(Article {
            title: item
                .precomputed_title
                .clone()
                .unwrap_or_else(|| "Untitled".to_string()),
            word_count: content.split_whitespace().count() as u32,
            content: content.clone(),
        });
    }

    pipeline.extractor.extract(&item.article_url).await
}
