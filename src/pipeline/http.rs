use async_trait::async_trait;
use serde_json::json;

use super::{Article, ContentExtractor, PipelineError, Publisher, VideoRenderer};

/// Calls the content-extraction backend: `POST {url}` with `{"url": ...}`,
/// expects `{"title", "content", "wordCount"}`.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
}

impl HttpExtractor {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build reqwest client"),
            url,
        }
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> Result<Article, PipelineError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "url": url }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PipelineError::from(format!(
                "Extraction service returned {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp.json().await?;
        let content = body["content"]
            .as_str()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| PipelineError::from("Could not extract article content"))?
            .to_string();

        Ok(Article {
            title: body["title"].as_str().unwrap_or("Untitled").to_string(),
            word_count: body["wordCount"].as_u64().unwrap_or(0) as u32,
            content,
        })
    }
}

/// Calls the render service. Renders run for minutes, so this client
/// carries a much longer timeout than the other collaborators.
pub struct HttpRenderer {
    client: reqwest::Client,
    url: String,
}

impl HttpRenderer {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(15 * 60))
                .build()
                .expect("Failed to build reqwest client"),
            url,
        }
    }
}

#[async_trait]
impl VideoRenderer for HttpRenderer {
    async fn render(
        &self,
        article: &Article,
        wpm: u32,
        template: Option<&str>,
    ) -> Result<String, PipelineError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({
                "title": article.title,
                "content": article.content,
                "wordCount": article.word_count,
                "wpm": wpm,
                "template": template,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PipelineError::from(format!(
                "Render service returned {}",
                resp.status()
            )));
        }

        let body: serde_json::Value = resp.json().await?;
        body["outputPath"]
            .as_str()
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .ok_or_else(|| PipelineError::from("Render service returned no output path"))
    }
}

/// Calls the posting service to attach a rendered video as a reply.
pub struct HttpPublisher {
    client: reqwest::Client,
    url: String,
}

impl HttpPublisher {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build reqwest client"),
            url,
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(
        &self,
        video_path: &str,
        reply_to_url: &str,
        account: &str,
    ) -> Result<(), PipelineError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({
                "videoPath": video_path,
                "replyToUrl": reply_to_url,
                "account": account,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(PipelineError::from(format!(
                "Posting service returned {}",
                resp.status()
            )));
        }

        Ok(())
    }
}
