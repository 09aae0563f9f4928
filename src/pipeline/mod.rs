pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;

/// Extracted article content, as returned by the extraction backend.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub content: String,
    pub word_count: u32,
}

#[derive(Debug)]
pub struct PipelineError {
    pub message: String,
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<String> for PipelineError {
    fn from(s: String) -> Self {
        PipelineError { message: s }
    }
}

impl From<&str> for PipelineError {
    fn from(s: &str) -> Self {
        PipelineError {
            message: s.to_string(),
        }
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(e: reqwest::Error) -> Self {
        PipelineError {
            message: e.to_string(),
        }
    }
}

/// Resolves a content URL into article text.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<Article, PipelineError>;
}

/// Renders article text into a video artifact; returns the artifact path.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    async fn render(
        &self,
        article: &Article,
        wpm: u32,
        template: Option<&str>,
    ) -> Result<String, PipelineError>;
}

/// Posts a rendered video as a reply on the given account. Failures here
/// are non-fatal to the owning queue item.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        video_path: &str,
        reply_to_url: &str,
        account: &str,
    ) -> Result<(), PipelineError>;
}

/// The external collaborators the sweep drives an item through.
#[derive(Clone)]
pub struct Pipeline {
    pub extractor: Arc<dyn ContentExtractor>,
    pub renderer: Arc<dyn VideoRenderer>,
    pub publisher: Arc<dyn Publisher>,
}

impl Pipeline {
    /// Production pipeline: HTTP clients against the configured
    /// extraction/render/post services.
    pub fn from_config(config: &Config) -> Self {
        Pipeline {
            extractor: Arc::new(http::HttpExtractor::new(config.extract_url.clone())),
            renderer: Arc::new(http::HttpRenderer::new(config.render_url.clone())),
            publisher: Arc::new(http::HttpPublisher::new(config.post_url.clone())),
        }
    }
}
