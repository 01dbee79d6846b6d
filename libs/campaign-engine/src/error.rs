use std::path::PathBuf;

use thiserror::Error;

use crate::fallback::ProviderFailureReport;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("history store {path} unavailable: {reason}")]
    StorageUnavailable { path: PathBuf, reason: String },
}

impl StorageError {
    pub(crate) fn unavailable(path: &std::path::Path, reason: impl ToString) -> Self {
        StorageError::StorageUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no topic candidates available")]
    NoCandidatesAvailable,
}

#[derive(Debug, Error)]
pub enum FallbackError {
    #[error("all {} providers exhausted", failures.len())]
    AllProvidersExhausted { failures: Vec<ProviderFailureReport> },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("static topic pool must not be empty")]
    EmptyTopicPool,

    #[error("at least one content provider must be configured")]
    NoProviders,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// Outcomes are keyed by platform, so two targets may not share a name.
    #[error("publish platform {0:?} is configured more than once")]
    DuplicatePlatform(String),
}

#[derive(Debug, Error)]
pub enum CampaignError {
    /// History could neither be read at the start of the cycle nor written at its end.
    #[error("campaign memory lost (load: {load}; save: {save})")]
    MemoryLost { load: StorageError, save: StorageError },

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
