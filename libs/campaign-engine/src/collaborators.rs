use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::BlogPost;
use crate::fallback::ProviderFailure;

/// A generation backend failure, classified for the fallback executor.
pub type GenerationFailed = ProviderFailure;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

/// Research source. Implementations swallow their own failures and return an empty list.
#[async_trait]
pub trait TrendFetcher: Send + Sync {
    async fn search(&self, query: &str) -> Vec<TrendHit>;
}

/// Fetchers that contribute nothing; used when research is disabled.
pub struct NoTrends;

#[async_trait]
impl TrendFetcher for NoTrends {
    async fn search(&self, _query: &str) -> Vec<TrendHit> {
        Vec::new()
    }
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate text for `prompt` with the backend named by `provider`.
    async fn generate(&self, provider: &str, prompt: &str) -> Result<String, GenerationFailed>;
}

/// Everything a publish target may need from one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignContent {
    pub topic: String,
    pub blog: BlogPost,
    pub social_caption: String,
    pub email: String,
    /// JSON-LD documents describing the blog post.
    pub schemas: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn published(identifier: impl Into<String>) -> Self {
        Self { success: true, identifier: Some(identifier.into()), error: None }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self { success: false, identifier: None, error: Some(reason.into()) }
    }
}

/// One destination platform. Never fails; every problem becomes a failed outcome.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    fn platform(&self) -> &str;

    async fn publish(&self, content: &CampaignContent) -> PublishOutcome;
}
