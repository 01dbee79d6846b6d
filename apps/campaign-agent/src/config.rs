use std::path::PathBuf;
use std::time::Duration as StdDuration;

use campaign_engine::config::{DEFAULT_MODELS, MAX_WINDOW_DAYS};
use campaign_engine::{CampaignConfig, ConfigError, ProviderSpec, RetryPolicy};
use llm_client::LlmProvider;
use serde::{Deserialize, Serialize};
use tracing::warn;

const DEFAULT_HISTORY_PATH: &str = "content_history.json";
const DEFAULT_RETENTION_DAYS: i64 = 7;
const DEFAULT_NOVELTY_DAYS: i64 = 7;
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 2000;
const DEFAULT_TRANSIENT_WAIT_MS: u64 = 2000;

/// A feed consulted during trend research.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceConfig {
    pub name: String,
    /// "rss" or "atom"; both are parsed the same way.
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentConfigError {
    #[error("{0} environment variable not set")]
    MissingApiKey(&'static str),

    #[error("unknown LLM_PROVIDER '{0}' (expected gemini, openai or claude)")]
    UnknownProvider(String),

    #[error("failed to load sources from {path}: {reason}")]
    Sources { path: PathBuf, reason: String },

    #[error(transparent)]
    Campaign(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopifyConfig {
    pub shop: String,
    pub access_token: String,
    pub blog_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacebookConfig {
    pub page_id: String,
    pub page_token: String,
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    pub models: Vec<String>,
    pub probe_models: bool,
    pub shopify: Option<ShopifyConfig>,
    pub facebook: Option<FacebookConfig>,
    pub history_path: PathBuf,
    pub output_dir: PathBuf,
    pub retention_days: i64,
    pub novelty_days: i64,
    pub retry: RetryPolicy,
    pub sources_path: Option<PathBuf>,
    pub search_base_url: Option<String>,
}

fn api_key_var(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Gemini => "GEMINI_API_KEY",
        LlmProvider::OpenAI => "OPENAI_API_KEY",
        LlmProvider::Claude => "CLAUDE_API_KEY",
    }
}

fn default_models(provider: LlmProvider) -> Vec<String> {
    match provider {
        LlmProvider::Gemini => DEFAULT_MODELS.iter().map(|s| s.to_string()).collect(),
        LlmProvider::OpenAI => vec!["gpt-4o-mini".to_string()],
        LlmProvider::Claude => vec!["claude-3-5-haiku-latest".to_string()],
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, AgentConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AgentConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let number = |key: &'static str, default: u64| -> u64 {
            match get(key) {
                None => default,
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!(key, value = %raw, default, "Unparsable number, using default");
                    default
                }),
            }
        };

        let days = |key: &'static str, default: i64| -> i64 {
            let value = number(key, default as u64);
            match i64::try_from(value) {
                Ok(d) if (1..=MAX_WINDOW_DAYS).contains(&d) => d,
                _ => {
                    warn!(key, value, max = MAX_WINDOW_DAYS, default, "Day count out of range, using default");
                    default
                }
            }
        };

        let llm_provider = match get("LLM_PROVIDER") {
            None => LlmProvider::Gemini,
            Some(name) => LlmProvider::from_name(&name).ok_or(AgentConfigError::UnknownProvider(name))?,
        };

        let key_var = api_key_var(llm_provider);
        let llm_api_key = get(key_var).ok_or(AgentConfigError::MissingApiKey(key_var))?;

        let models = get("LLM_MODELS")
            .map(|raw| parse_list(&raw))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_models(llm_provider));

        let shopify = match (get("SHOPIFY_SHOP"), get("SHOPIFY_ACCESS_TOKEN"), get("SHOPIFY_BLOG_ID")) {
            (Some(shop), Some(access_token), Some(blog_id)) => Some(ShopifyConfig { shop, access_token, blog_id }),
            _ => None,
        };

        let facebook = match (get("FACEBOOK_PAGE_ID"), get("FACEBOOK_PAGE_TOKEN")) {
            (Some(page_id), Some(page_token)) => Some(FacebookConfig { page_id, page_token }),
            _ => None,
        };

        let retry = RetryPolicy {
            max_retries_per_provider: number("MAX_RETRIES_PER_PROVIDER", DEFAULT_MAX_RETRIES as u64) as u32,
            backoff_base: StdDuration::from_millis(number("BACKOFF_BASE_MS", DEFAULT_BACKOFF_BASE_MS)),
            transient_wait: StdDuration::from_millis(number("TRANSIENT_WAIT_MS", DEFAULT_TRANSIENT_WAIT_MS)),
            ..RetryPolicy::default()
        };

        Ok(Self {
            llm_provider,
            llm_api_key,
            llm_base_url: get("LLM_BASE_URL"),
            models,
            probe_models: get("PROBE_MODELS").map(|v| parse_flag(&v)).unwrap_or(false),
            shopify,
            facebook,
            history_path: get("HISTORY_PATH").unwrap_or_else(|| DEFAULT_HISTORY_PATH.to_string()).into(),
            output_dir: get("OUTPUT_DIR").unwrap_or_else(|| ".".to_string()).into(),
            retention_days: days("RETENTION_DAYS", DEFAULT_RETENTION_DAYS),
            novelty_days: days("NOVELTY_DAYS", DEFAULT_NOVELTY_DAYS),
            retry,
            sources_path: get("SOURCES_PATH").map(PathBuf::from),
            search_base_url: get("SEARCH_BASE_URL"),
        })
    }

    /// The explicit configuration handed to the campaign engine.
    pub fn campaign_config(&self) -> Result<CampaignConfig, AgentConfigError> {
        let config = CampaignConfig {
            content_providers: ProviderSpec::ordered(self.models.iter().cloned()),
            retry: self.retry.clone(),
            retention: window("retention_days", self.retention_days)?,
            novelty_window: window("novelty_days", self.novelty_days)?,
            ..CampaignConfig::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Feeds listed in `SOURCES_PATH`, or none when it is unset.
    pub fn load_sources(&self) -> Result<Vec<SourceConfig>, AgentConfigError> {
        let Some(path) = &self.sources_path else {
            return Ok(Vec::new());
        };
        let sources_error = |reason: String| AgentConfigError::Sources { path: path.clone(), reason };

        let data = std::fs::read(path).map_err(|e| sources_error(e.to_string()))?;
        serde_json::from_slice(&data).map_err(|e| sources_error(e.to_string()))
    }
}

fn window(key: &'static str, days: i64) -> Result<chrono::Duration, AgentConfigError> {
    chrono::Duration::try_days(days).ok_or_else(|| {
        AgentConfigError::Campaign(ConfigError::Invalid {
            key,
            reason: format!("{days} days is out of range"),
        })
    })
}
