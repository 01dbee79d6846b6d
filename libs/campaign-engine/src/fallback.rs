//! Ordered provider fallback with classified retries.
//!
//! Each provider gets a bounded number of attempts. Rate limits back off
//! exponentially on the same provider, a missing provider/endpoint is
//! abandoned at once, anything else retries after a short fixed wait.

use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::FallbackError;

const RATE_LIMIT_PATTERNS: &[&str] = &[
    "429",
    "rate limit",
    "rate_limit",
    "ratelimit",
    "quota",
    "resource_exhausted",
    "resource exhausted",
    "too many requests",
];

const NOT_FOUND_PATTERNS: &[&str] = &[
    "404",
    "not found",
    "not_found",
    "does not exist",
    "no such model",
    "unknown model",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    RateLimited,
    NotFound,
    Transient,
}

impl FailureKind {
    /// Classify a failure from its message text.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if RATE_LIMIT_PATTERNS.iter().any(|p| lower.contains(p)) {
            FailureKind::RateLimited
        } else if NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p)) {
            FailureKind::NotFound
        } else {
            FailureKind::Transient
        }
    }

    /// Classify from an HTTP status when it is decisive on its own.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            429 => Some(FailureKind::RateLimited),
            404 => Some(FailureKind::NotFound),
            _ => None,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::RateLimited => write!(f, "rate limited"),
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Transient => write!(f, "transient"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ProviderFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Build a failure whose kind is inferred from the message.
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self { kind: FailureKind::classify(&message), message }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(FailureKind::RateLimited, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, message)
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub identifier: String,
    pub priority: u32,
}

impl ProviderSpec {
    pub fn new(identifier: impl Into<String>, priority: u32) -> Self {
        Self { identifier: identifier.into(), priority }
    }

    /// Priorities follow list position.
    pub fn ordered<I, S>(identifiers: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        identifiers
            .into_iter()
            .enumerate()
            .map(|(i, id)| Self::new(id, i as u32))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per provider, including the first one.
    pub max_retries_per_provider: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
    pub transient_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries_per_provider: 2,
            backoff_base: Duration::from_secs(2),
            max_backoff: Duration::from_secs(60),
            transient_wait: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Yields `backoff_base * 2^attempt`, capped at `max_backoff`, without jitter.
    pub fn rate_limit_schedule(&self) -> ExponentialBackoff {
        let mut schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.backoff_base)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build();
        schedule.reset();
        schedule
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailureReport {
    pub provider: String,
    pub kind: FailureKind,
    pub message: String,
    pub attempts: u32,
}

/// Successful value plus the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served<T> {
    pub value: T,
    pub provider: String,
    pub attempts: u32,
}

#[derive(Debug, Clone, Default)]
pub struct FallbackExecutor {
    policy: RetryPolicy,
}

impl FallbackExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub async fn execute<T, F, Fut>(
        &self,
        providers: &[ProviderSpec],
        mut op: F,
    ) -> Result<Served<T>, FallbackError>
    where
        F: FnMut(&ProviderSpec) -> Fut,
        Fut: Future<Output = Result<T, ProviderFailure>>,
    {
        let mut ordered: Vec<&ProviderSpec> = providers.iter().collect();
        ordered.sort_by_key(|p| p.priority);

        let max_attempts = self.policy.max_retries_per_provider.max(1);
        let mut failures = Vec::with_capacity(ordered.len());

        for provider in ordered {
            let mut schedule = self.policy.rate_limit_schedule();
            let mut attempt: u32 = 0;

            let last_failure = loop {
                // advanced on every attempt so the n-th retry waits base * 2^n
                let rate_delay = schedule.next_backoff().unwrap_or(self.policy.max_backoff);
                attempt += 1;
                debug!(provider = %provider.identifier, attempt, "Trying provider");

                let failure = match op(provider).await {
                    Ok(value) => {
                        info!(provider = %provider.identifier, attempt, "Provider succeeded");
                        return Ok(Served {
                            value,
                            provider: provider.identifier.clone(),
                            attempts: attempt,
                        });
                    }
                    Err(failure) => failure,
                };

                warn!(
                    provider = %provider.identifier,
                    attempt,
                    kind = %failure.kind,
                    error = %failure.message,
                    "Provider attempt failed"
                );

                if failure.kind == FailureKind::NotFound || attempt >= max_attempts {
                    break failure;
                }

                let wait = match failure.kind {
                    FailureKind::RateLimited => rate_delay,
                    _ => self.policy.transient_wait,
                };
                if !wait.is_zero() {
                    debug!(provider = %provider.identifier, wait_ms = wait.as_millis() as u64, "Waiting before retry");
                    tokio::time::sleep(wait).await;
                }
            };

            failures.push(ProviderFailureReport {
                provider: provider.identifier.clone(),
                kind: last_failure.kind,
                message: last_failure.message,
                attempts: attempt,
            });
        }

        warn!(providers = failures.len(), "All providers exhausted");
        Err(FallbackError::AllProvidersExhausted { failures })
    }
}

/// Move providers that pass `probe` to the front, keeping relative order within
/// the responsive and unresponsive groups, and renumber priorities.
pub async fn probe_order<F, Fut>(providers: &[ProviderSpec], mut probe: F) -> Vec<ProviderSpec>
where
    F: FnMut(&ProviderSpec) -> Fut,
    Fut: Future<Output = bool>,
{
    let mut sorted: Vec<&ProviderSpec> = providers.iter().collect();
    sorted.sort_by_key(|p| p.priority);

    let mut alive = Vec::new();
    let mut dead = Vec::new();
    for provider in sorted {
        if probe(provider).await {
            info!(provider = %provider.identifier, "Provider probe ok");
            alive.push(provider.identifier.clone());
        } else {
            warn!(provider = %provider.identifier, "Provider probe failed, demoting");
            dead.push(provider.identifier.clone());
        }
    }

    ProviderSpec::ordered(alive.into_iter().chain(dead))
}
