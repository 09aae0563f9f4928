#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Notify;

use reelqueue::config::{AccountConfig, Config};
use reelqueue::pipeline::{
    Article, ContentExtractor, Pipeline, PipelineError, Publisher, VideoRenderer,
};
use reelqueue::scheduler::Scheduler;
use reelqueue::state::{AppState, SharedState};

pub const MIN_SPACING_MS: i64 = 1_200_000;

/// Config pointing at a throwaway data dir: capped `main` (3/day) plus an
/// uncapped `backup` overflow account. The sweep interval is set high so
/// tests drive sweeps explicitly.
pub fn test_config(data_dir: &TempDir) -> Config {
    config_with_accounts(
        data_dir,
        vec![
            AccountConfig {
                name: "main".to_string(),
                daily_cap: Some(3),
            },
            AccountConfig {
                name: "backup".to_string(),
                daily_cap: None,
            },
        ],
    )
}

pub fn config_with_accounts(data_dir: &TempDir, accounts: Vec<AccountConfig>) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: data_dir.path().to_path_buf(),
        min_spacing_ms: MIN_SPACING_MS,
        sweep_interval_ms: 3_600_000,
        accounts,
        extract_url: "http://unused.invalid".to_string(),
        render_url: "http://unused.invalid".to_string(),
        post_url: "http://unused.invalid".to_string(),
        log_level: "warn".to_string(),
    }
}

// ── Stub collaborators ──────────────────────────────────────────────

pub struct StubExtractor;

#[async_trait]
impl ContentExtractor for StubExtractor {
    async fn extract(&self, _url: &str) -> Result<Article, PipelineError> {
        Ok(Article {
            title: "Test Article".to_string(),
            content: "one two three four five".to_string(),
            word_count: 5,
        })
    }
}

/// Extractor that always errors, for proving a path never reaches it.
pub struct FailingExtractor;

#[async_trait]
impl ContentExtractor for FailingExtractor {
    async fn extract(&self, _url: &str) -> Result<Article, PipelineError> {
        Err(PipelineError::from("extraction should not have been called"))
    }
}

/// Lets a test hold a render call open: the renderer signals `entered`,
/// then waits on `release`.
pub struct RenderGate {
    pub entered: Notify,
    pub release: Notify,
}

impl RenderGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
        })
    }
}

pub struct StubRenderer {
    pub calls: AtomicUsize,
    fail: bool,
    gate: Option<Arc<RenderGate>>,
}

impl StubRenderer {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            gate: None,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
            gate: None,
        })
    }

    pub fn gated(gate: Arc<RenderGate>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            gate: Some(gate),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoRenderer for StubRenderer {
    async fn render(
        &self,
        _article: &Article,
        _wpm: u32,
        _template: Option<&str>,
    ) -> Result<String, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.fail {
            Err(PipelineError::from("render exploded"))
        } else {
            Ok("/out/video.mp4".to_string())
        }
    }
}

pub struct StubPublisher {
    pub calls: AtomicUsize,
    fail: bool,
}

impl StubPublisher {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(
        &self,
        _video_path: &str,
        _reply_to_url: &str,
        _account: &str,
    ) -> Result<(), PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            Err(PipelineError::from("post rejected"))
        } else {
            Ok(())
        }
    }
}

pub fn stub_pipeline(renderer: Arc<StubRenderer>, publisher: Arc<StubPublisher>) -> Pipeline {
    Pipeline {
        extractor: Arc::new(StubExtractor),
        renderer,
        publisher,
    }
}

// ── HTTP test harness ───────────────────────────────────────────────

/// A running test server with stub collaborators and a throwaway data dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: SharedState,
    pub renderer: Arc<StubRenderer>,
    pub publisher: Arc<StubPublisher>,
    _data_dir: TempDir,
}

pub async fn spawn_app() -> TestApp {
    let data_dir = TempDir::new().expect("failed to create temp data dir");
    let config = test_config(&data_dir);

    let scheduler = Scheduler::load(&config).await;
    let renderer = StubRenderer::ok();
    let publisher = StubPublisher::ok();
    let pipeline = stub_pipeline(renderer.clone(), publisher.clone());

    let state: SharedState = Arc::new(AppState {
        config,
        scheduler,
        pipeline,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    let app = reelqueue::build_app(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
        renderer,
        publisher,
        _data_dir: data_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Submit to POST /api/queue, return the body + status.
    pub async fn post_queue(&self, body: Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/queue"))
            .json(&body)
            .send()
            .await
            .expect("queue request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        (body, status)
    }

    pub async fn get_queue(&self) -> Value {
        let resp = self
            .client
            .get(self.url("/api/queue"))
            .send()
            .await
            .expect("queue status request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }

    pub async fn post_reset(&self, body: Value) -> Value {
        let resp = self
            .client
            .post(self.url("/api/reset"))
            .json(&body)
            .send()
            .await
            .expect("reset request failed");
        assert_eq!(resp.status(), StatusCode::OK);
        resp.json().await.unwrap()
    }
}
