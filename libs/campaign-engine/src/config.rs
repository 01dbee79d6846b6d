use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fallback::{ProviderSpec, RetryPolicy};

/// Static brand facts used in prompts and fallback templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    pub product: String,
    pub tagline: String,
    pub website: String,
    pub price: String,
    /// ISO 4217 code for `price`.
    pub currency: String,
    pub pricing_summary: String,
    pub target_audience: String,
    pub default_tags: Vec<String>,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            name: "SayPlay".to_string(),
            product: "NFC voice/video message stickers for gifts".to_string(),
            tagline: "Just tap, no app!".to_string(),
            website: "https://sayplay.co.uk".to_string(),
            price: "£8.99".to_string(),
            currency: "GBP".to_string(),
            pricing_summary: "£8.99 (1 sticker), £24.99 (3-pack), £49.99 (6-pack best value)".to_string(),
            target_audience: "Gift buyers aged 25-55, primarily UK market".to_string(),
            default_tags: [
                "voice-message-gifts",
                "personalized-gifts",
                "sayplay",
                "uk-gifts",
                "gift-ideas",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

pub const DEFAULT_TOPIC_POOL: &[&str] = &[
    "Creative Ways to Use Voice Message Gifts",
    "Best Personalized Gifts UK",
    "Wedding Gift Ideas That Feel Thoughtful",
    "Birthday Gift Ideas Beyond Generic Cards",
    "Baby Shower Gifts New Parents Will Love",
    "Christmas Gift Ideas With Personal Touch",
    "Valentine's Day Gifts That Show You Care",
    "Anniversary Gift Ideas For Couples",
    "Thank You Gifts That Actually Mean Something",
    "Graduation Gifts They'll Remember Forever",
    "Long Distance Relationship Gift Ideas",
    "Gifts For Him That Aren't Generic",
    "Gifts For Her That Show Effort",
    "Corporate Gift Ideas That Stand Out",
    "Wedding Invitation Ideas That Get Noticed",
];

pub const DEFAULT_RESEARCH_QUERIES: &[&str] = &[
    "best personalized gifts UK",
    "unique gift ideas trending",
    "voice message gifts",
];

pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash", "gemini-1.5-flash"];

/// Trend-derived candidates are capped so the static pool always gets a look in.
pub const MAX_TREND_CANDIDATES: usize = 5;

/// Generated blog bodies shorter than this are rejected and retried.
pub const MIN_BLOG_CHARS: usize = 500;

/// Longest accepted retention or novelty window, in days.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Everything one campaign cycle needs, passed explicitly into the orchestrator.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    pub brand: BrandConfig,
    pub static_topic_pool: Vec<String>,
    pub research_queries: Vec<String>,
    pub content_providers: Vec<ProviderSpec>,
    pub retry: RetryPolicy,
    pub retention: Duration,
    pub novelty_window: Duration,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            brand: BrandConfig::default(),
            static_topic_pool: DEFAULT_TOPIC_POOL.iter().map(|s| s.to_string()).collect(),
            research_queries: DEFAULT_RESEARCH_QUERIES.iter().map(|s| s.to_string()).collect(),
            content_providers: ProviderSpec::ordered(DEFAULT_MODELS.iter().copied()),
            retry: RetryPolicy::default(),
            retention: Duration::days(7),
            novelty_window: Duration::days(7),
        }
    }
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.static_topic_pool.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::EmptyTopicPool);
        }
        if self.content_providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }
        check_window("retention", self.retention)?;
        check_window("novelty_window", self.novelty_window)?;
        Ok(())
    }
}

fn check_window(key: &'static str, window: Duration) -> Result<(), ConfigError> {
    if window <= Duration::zero() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be positive".to_string(),
        });
    }
    if window > Duration::days(MAX_WINDOW_DAYS) {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("must not exceed {MAX_WINDOW_DAYS} days"),
        });
    }
    Ok(())
}
