use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CLAUDE_BASE_URL: &str = "https://api.anthropic.com/v1";

const CLAUDE_API_VERSION: &str = "2023-06-01";
const CLAUDE_MAX_TOKENS: u32 = 4096;
/// Error bodies are truncated to this many characters before being carried in errors
const MAX_ERROR_BODY_CHARS: usize = 300;

// --- Shared Utilities ---

/// Extract the domain/host from a URL string safely.
/// Returns "unknown" if the URL cannot be parsed.
pub fn extract_domain(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

// --- Shared Logging ---

/// Initialize structured logging with JSON format in production (when RUST_LOG is set),
/// or pretty format for local development.
pub fn init_logging() {
    let is_production = std::env::var("RUST_LOG").is_ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if is_production {
        let _ = fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}

// --- Errors ---

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API returned {status}: {body}")]
    Status {
        provider: LlmProvider,
        status: u16,
        body: String,
    },

    #[error("{provider} API error: {message}")]
    Api {
        provider: LlmProvider,
        message: String,
    },

    #[error("No content returned from {0}")]
    EmptyResponse(LlmProvider),
}

impl LlmError {
    /// HTTP status of the failed call, when the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            LlmError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

// --- Provider selection ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    OpenAI,
    Claude,
}

impl LlmProvider {
    /// Parse a provider name as used in configuration ("gemini", "openai", "claude").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(LlmProvider::Gemini),
            "openai" | "gpt" => Some(LlmProvider::OpenAI),
            "claude" | "anthropic" => Some(LlmProvider::Claude),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => DEFAULT_GEMINI_BASE_URL,
            LlmProvider::OpenAI => DEFAULT_OPENAI_BASE_URL,
            LlmProvider::Claude => DEFAULT_CLAUDE_BASE_URL,
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Gemini => write!(f, "Gemini"),
            LlmProvider::OpenAI => write!(f, "OpenAI"),
            LlmProvider::Claude => write!(f, "Claude"),
        }
    }
}

// --- Gemini Structs ---
#[derive(Serialize, Deserialize, Debug)]
pub struct GeminiPart {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct GeminiContent {
    pub parts: Vec<GeminiPart>,
}

#[derive(Serialize, Debug)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

#[derive(Deserialize, Debug)]
pub struct GeminiCandidate {
    pub content: GeminiContent,
}

#[derive(Deserialize, Debug)]
pub struct GeminiResponse {
    pub candidates: Option<Vec<GeminiCandidate>>,
    pub error: Option<ApiErrorBody>,
}

#[derive(Deserialize, Debug)]
pub struct ApiErrorBody {
    pub message: String,
}

// --- OpenAI Structs ---
#[derive(Serialize, Deserialize, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiChoice {
    pub message: ChatMessage,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiResponse {
    pub choices: Option<Vec<OpenAiChoice>>,
    pub error: Option<ApiErrorBody>,
}

// --- Claude Structs ---
#[derive(Serialize, Debug)]
pub struct ClaudeRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Deserialize, Debug)]
pub struct ClaudeBlock {
    pub text: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ClaudeResponse {
    pub content: Option<Vec<ClaudeBlock>>,
    pub error: Option<ApiErrorBody>,
}

// --- Client ---

/// A text-generation backend reachable over HTTP. The model is chosen per call so
/// that callers can walk a list of model names against the same account.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(http: reqwest::Client, provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            http,
            provider,
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
        }
    }

    /// Point the client at a different host (proxies, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Single generation call, no retries.
    #[instrument(skip(self, prompt), fields(provider = %self.provider, prompt_len = prompt.len()))]
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        match self.provider {
            LlmProvider::Gemini => self.call_gemini(model, prompt).await,
            LlmProvider::OpenAI => self.call_openai(model, prompt).await,
            LlmProvider::Claude => self.call_claude(model, prompt).await,
        }
    }

    async fn call_gemini(&self, model: &str, text: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let request = GeminiRequest {
            contents: vec![
                GeminiContent {
                    parts: vec![ GeminiPart { text: text.to_string() } ]
                }
            ]
        };

        debug!("Sending request to Gemini API");

        let res = self.http.post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let res = self.check_status(res).await?;
        let resp: GeminiResponse = res.json().await?;

        if let Some(error) = resp.error {
            return Err(LlmError::Api { provider: self.provider, message: error.message });
        }

        resp.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|first| first.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or(LlmError::EmptyResponse(self.provider))
    }

    async fn call_openai(&self, model: &str, text: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = OpenAiRequest {
            model: model.to_string(),
            messages: vec![ChatMessage { role: "user".to_string(), content: text.to_string() }],
        };

        let res = self.http.post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let res = self.check_status(res).await?;
        let resp: OpenAiResponse = res.json().await?;

        if let Some(error) = resp.error {
            return Err(LlmError::Api { provider: self.provider, message: error.message });
        }

        resp.choices
            .and_then(|choices| choices.into_iter().next())
            .map(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse(self.provider))
    }

    async fn call_claude(&self, model: &str, text: &str) -> Result<String, LlmError> {
        let url = format!("{}/messages", self.base_url);

        let request = ClaudeRequest {
            model: model.to_string(),
            max_tokens: CLAUDE_MAX_TOKENS,
            messages: vec![ChatMessage { role: "user".to_string(), content: text.to_string() }],
        };

        let res = self.http.post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", CLAUDE_API_VERSION)
            .json(&request)
            .send()
            .await?;

        let res = self.check_status(res).await?;
        let resp: ClaudeResponse = res.json().await?;

        if let Some(error) = resp.error {
            return Err(LlmError::Api { provider: self.provider, message: error.message });
        }

        resp.content
            .unwrap_or_default()
            .into_iter()
            .find_map(|block| block.text)
            .ok_or(LlmError::EmptyResponse(self.provider))
    }

    async fn check_status(&self, res: reqwest::Response) -> Result<reqwest::Response, LlmError> {
        let status = res.status();
        debug!(status = %status, "LLM API response received");

        if status.is_success() {
            return Ok(res);
        }

        let body: String = res.text().await
            .unwrap_or_default()
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect();
        Err(LlmError::Status { provider: self.provider, status: status.as_u16(), body })
    }
}
