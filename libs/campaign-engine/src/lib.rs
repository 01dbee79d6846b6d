//! Campaign topic selection with anti-repetition, provider fallback, and the
//! cycle that ties research, generation, publishing and history together.

pub mod collaborators;
pub mod config;
pub mod content;
pub mod error;
pub mod fallback;
pub mod history;
pub mod orchestrator;
pub mod prompts;
pub mod schema;
pub mod scorer;
pub mod seasonal;
pub mod templates;

pub use collaborators::{
    CampaignContent, ContentGenerator, GenerationFailed, NoTrends, PublishOutcome, PublishTarget,
    TrendFetcher, TrendHit,
};
pub use config::{BrandConfig, CampaignConfig};
pub use content::{ArtifactKind, ArtifactOrigin, BlogPost, GeneratedArtifact, LlmOutput};
pub use error::{CampaignError, ConfigError, FallbackError, SelectionError, StorageError};
pub use fallback::{
    FailureKind, FallbackExecutor, ProviderFailure, ProviderFailureReport, ProviderSpec, RetryPolicy,
    Served,
};
pub use history::{HistoryEntry, HistoryStore, JsonHistoryStore};
pub use orchestrator::{CampaignResult, Orchestrator};
pub use scorer::{TopicCandidate, TopicScorer};
pub use schema::{render_json_ld, schema_markup};
pub use seasonal::SeasonalContext;
