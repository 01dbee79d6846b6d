use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::collaborators::{
    CampaignContent, ContentGenerator, PublishOutcome, PublishTarget, TrendFetcher, TrendHit,
};
use crate::config::{CampaignConfig, MAX_TREND_CANDIDATES, MIN_BLOG_CHARS};
use crate::content::{
    parse_blog_post, parse_json_block, title_case, ArtifactKind, ArtifactOrigin, BlogPost,
    GeneratedArtifact, LlmOutput, TrendAnalysis,
};
use crate::error::{CampaignError, ConfigError, FallbackError, SelectionError};
use crate::fallback::{probe_order, FallbackExecutor, ProviderFailure, Served};
use crate::history::{HistoryEntry, HistoryStore};
use crate::prompts;
use crate::schema;
use crate::scorer::{TopicCandidate, TopicScorer};
use crate::seasonal::SeasonalContext;
use crate::templates;

/// Instagram's caption limit; longer captions are cut.
const MAX_CAPTION_CHARS: usize = 2200;
/// Research titles shorter than this are usually navigation, not topics.
const MIN_TREND_TITLE_CHARS: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct CampaignResult {
    pub started_at: DateTime<Utc>,
    pub selected_topic: TopicCandidate,
    pub blog: BlogPost,
    pub generated_artifacts: BTreeMap<ArtifactKind, GeneratedArtifact>,
    pub publish_outcomes: BTreeMap<String, PublishOutcome>,
    pub history_recorded: bool,
}

impl CampaignResult {
    pub fn successful_platforms(&self) -> impl Iterator<Item = &str> {
        self.publish_outcomes
            .iter()
            .filter(|(_, o)| o.success)
            .map(|(name, _)| name.as_str())
    }

    pub fn template_artifacts(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.generated_artifacts
            .iter()
            .filter(|(_, a)| a.is_template())
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for CampaignResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==== Campaign report {} ====", self.started_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(f, "Topic: {} (overlap {})", self.selected_topic.text, self.selected_topic.overlap_score)?;
        writeln!(f, "Blog title: {}", self.blog.title)?;
        writeln!(f, "Artifacts:")?;
        for (kind, artifact) in &self.generated_artifacts {
            match &artifact.origin {
                ArtifactOrigin::Generated { provider } => {
                    writeln!(f, "  {:<16} AI ({})", kind.as_str(), provider)?
                }
                ArtifactOrigin::Template => writeln!(f, "  {:<16} template fallback", kind.as_str())?,
            }
        }
        writeln!(f, "Publishing:")?;
        if self.publish_outcomes.is_empty() {
            writeln!(f, "  (no targets configured)")?;
        }
        for (platform, outcome) in &self.publish_outcomes {
            match (outcome.success, &outcome.identifier, &outcome.error) {
                (true, Some(id), _) => writeln!(f, "  {:<16} published ({})", platform, id)?,
                (true, None, _) => writeln!(f, "  {:<16} published", platform)?,
                (false, _, Some(err)) => writeln!(f, "  {:<16} FAILED: {}", platform, err)?,
                (false, _, None) => writeln!(f, "  {:<16} FAILED", platform)?,
            }
        }
        write!(
            f,
            "History: {}",
            if self.history_recorded { "recorded" } else { "NOT recorded" }
        )
    }
}

pub struct Orchestrator {
    config: CampaignConfig,
    scorer: TopicScorer,
    executor: FallbackExecutor,
    trends: Arc<dyn TrendFetcher>,
    generator: Arc<dyn ContentGenerator>,
    targets: Vec<Arc<dyn PublishTarget>>,
    history: Arc<dyn HistoryStore>,
}

impl Orchestrator {
    pub fn new(
        config: CampaignConfig,
        trends: Arc<dyn TrendFetcher>,
        generator: Arc<dyn ContentGenerator>,
        targets: Vec<Arc<dyn PublishTarget>>,
        history: Arc<dyn HistoryStore>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        {
            let mut platforms = HashSet::new();
            if let Some(dup) = targets.iter().map(|t| t.platform()).find(|p| !platforms.insert(*p)) {
                return Err(ConfigError::DuplicatePlatform(dup.to_string()));
            }
        }
        Ok(Self {
            scorer: TopicScorer::new(config.novelty_window),
            executor: FallbackExecutor::new(config.retry.clone()),
            config,
            trends,
            generator,
            targets,
            history,
        })
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    /// Reorder the content providers so that models answering a trivial prompt go first.
    pub async fn probe_content_providers(&mut self) {
        let generator = self.generator.as_ref();
        let reordered = probe_order(&self.config.content_providers, |p| {
            let model = p.identifier.clone();
            async move { generator.generate(&model, prompts::PROBE).await.is_ok() }
        })
        .await;
        self.config.content_providers = reordered;
    }

    pub async fn run_cycle(&self) -> Result<CampaignResult, CampaignError> {
        self.run_cycle_at(Utc::now()).await
    }

    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CampaignResult, CampaignError> {
        let season = SeasonalContext::for_date(now.date_naive());
        info!(season = %season.season, year = season.year, events = %season.events_label(), "Starting campaign cycle");

        // 1. History (fail-open)
        let (history, load_error) = match self.history.load() {
            Ok(entries) => {
                info!(entries = entries.len(), "Loaded campaign history");
                (entries, None)
            }
            Err(e) => {
                warn!(error = %e, "History unavailable, treating as empty");
                (Vec::new(), Some(e))
            }
        };

        // 2. Research
        let hits = self.research().await;
        let (trend_candidates, trend_keywords) = self.trend_candidates(&hits, &season).await;

        // 3. Selection
        let mut candidates = trend_candidates;
        candidates.extend(self.config.static_topic_pool.iter().filter(|t| !t.trim().is_empty()).cloned());

        let ranked = self.scorer.score_at(&candidates, &history, now);
        let selected = ranked.first().cloned().ok_or(SelectionError::NoCandidatesAvailable)?;
        info!(
            topic = %selected.text,
            overlap = selected.overlap_score,
            candidates = ranked.len(),
            "Selected campaign topic"
        );
        if let Some(runner_up) = ranked.get(1) {
            debug!(topic = %runner_up.text, overlap = runner_up.overlap_score, "Runner-up topic");
        }

        // 4. Content, sequential: later artifacts reference the blog title
        let mut artifacts = BTreeMap::new();

        let (blog, blog_artifact) = self.generate_blog(&selected.text, &season).await;
        artifacts.insert(ArtifactKind::Blog, blog_artifact);

        let social = self.generate_social(&blog.title, &selected.text, &season).await;
        let social_caption = social.text.clone();
        artifacts.insert(ArtifactKind::SocialCaption, social);

        let email = self.generate_email(&blog.title, &selected.text, &season).await;
        let email_text = email.text.clone();
        artifacts.insert(ArtifactKind::Email, email);

        // 5. Publish, each target independent
        let content = CampaignContent {
            topic: selected.text.clone(),
            blog: blog.clone(),
            social_caption,
            email: email_text,
            schemas: schema::schema_markup(&blog, &self.config.brand, now),
        };
        let publish_outcomes = self.publish_all(&content).await;

        // 6. Record
        let entry = HistoryEntry::new(now, selected.text.clone())
            .with_keywords(blog.tags.iter().cloned().chain(trend_keywords))
            .with_platforms(
                publish_outcomes
                    .iter()
                    .filter(|(_, o)| o.success)
                    .map(|(name, _)| name.clone()),
            );

        let history_recorded = match (self.history.append(entry), load_error) {
            (Ok(()), _) => true,
            (Err(save), Some(load)) => {
                return Err(CampaignError::MemoryLost { load, save });
            }
            (Err(save), None) => {
                warn!(error = %save, "Failed to record campaign history");
                false
            }
        };

        let result = CampaignResult {
            started_at: now,
            selected_topic: selected,
            blog,
            generated_artifacts: artifacts,
            publish_outcomes,
            history_recorded,
        };

        info!(
            templates = result.template_artifacts().count(),
            published = result.successful_platforms().count(),
            "Campaign cycle complete"
        );
        Ok(result)
    }

    async fn research(&self) -> Vec<TrendHit> {
        let mut seen = HashSet::new();
        let mut hits = Vec::new();

        for query in &self.config.research_queries {
            let found = self.trends.search(query).await;
            debug!(query = %query, count = found.len(), "Research results");
            for hit in found {
                let key = if hit.url.is_empty() { hit.title.to_lowercase() } else { hit.url.clone() };
                if seen.insert(key) {
                    hits.push(hit);
                }
            }
        }

        info!(hits = hits.len(), "Trend research complete");
        hits
    }

    /// Candidates and keywords derived from research. Model-extracted themes are
    /// preferred; raw hit titles are used when extraction fails.
    async fn trend_candidates(&self, hits: &[TrendHit], season: &SeasonalContext) -> (Vec<String>, Vec<String>) {
        if hits.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let prompt = prompts::trend_analysis(hits, &self.config.brand);
        let analysis = match self.generate_text(&prompt).await {
            Ok(served) => match parse_json_block::<TrendAnalysis>(&served.value) {
                LlmOutput::Parsed(analysis) => Some(analysis),
                LlmOutput::Malformed(raw) => {
                    warn!(raw_len = raw.len(), "Trend analysis was not valid JSON");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Trend analysis unavailable");
                None
            }
        };

        match analysis {
            Some(analysis) if !analysis.themes.is_empty() => {
                let candidates: Vec<String> = analysis
                    .themes
                    .iter()
                    .filter(|t| !t.trim().is_empty())
                    .take(MAX_TREND_CANDIDATES)
                    .map(|t| format!("{} - Ultimate Guide {}", title_case(t), season.year))
                    .collect();
                info!(themes = candidates.len(), "Trend themes extracted");
                (candidates, analysis.keywords)
            }
            _ => {
                let mut seen = HashSet::new();
                let candidates: Vec<String> = hits
                    .iter()
                    .map(|h| h.title.trim().to_string())
                    .filter(|t| t.chars().count() > MIN_TREND_TITLE_CHARS)
                    .filter(|t| seen.insert(t.to_lowercase()))
                    .take(MAX_TREND_CANDIDATES)
                    .collect();
                info!(titles = candidates.len(), "Using research titles as candidates");
                (candidates, Vec::new())
            }
        }
    }

    async fn generate_text(&self, prompt: &str) -> Result<Served<String>, FallbackError> {
        let generator = self.generator.as_ref();
        self.executor
            .execute(&self.config.content_providers, |p| {
                let model = p.identifier.clone();
                async move { generator.generate(&model, prompt).await }
            })
            .await
    }

    async fn generate_blog(&self, topic: &str, season: &SeasonalContext) -> (BlogPost, GeneratedArtifact) {
        let prompt_text = prompts::blog_post(topic, &self.config.brand, season);
        let prompt = prompt_text.as_str();
        let generator = self.generator.as_ref();
        let brand = &self.config.brand;

        let served = self
            .executor
            .execute(&self.config.content_providers, |p| {
                let model = p.identifier.clone();
                async move {
                    let text = generator.generate(&model, prompt).await?;
                    let post = parse_blog_post(&text, brand);
                    let chars = post.content.chars().count();
                    if chars < MIN_BLOG_CHARS {
                        return Err(ProviderFailure::transient(format!(
                            "generated blog too short ({} chars)",
                            chars
                        )));
                    }
                    Ok(post)
                }
            })
            .await;

        match served {
            Ok(served) => {
                info!(provider = %served.provider, title = %served.value.title, "Blog post generated");
                let artifact = GeneratedArtifact::generated(served.value.content.clone(), served.provider);
                (served.value, artifact)
            }
            Err(e) => {
                warn!(error = %e, "Blog generation failed, using template");
                let post = templates::blog_post(topic, &self.config.brand, season);
                let artifact = GeneratedArtifact::template(post.content.clone());
                (post, artifact)
            }
        }
    }

    async fn generate_social(&self, blog_title: &str, topic: &str, season: &SeasonalContext) -> GeneratedArtifact {
        let prompt = prompts::social_caption(blog_title, topic, &self.config.brand, season);
        match self.generate_nonempty(&prompt).await {
            Some(served) => {
                let caption: String = served.value.chars().take(MAX_CAPTION_CHARS).collect();
                GeneratedArtifact::generated(caption, served.provider)
            }
            None => {
                warn!("Social caption generation failed, using template");
                GeneratedArtifact::template(templates::social_caption(blog_title, topic, &self.config.brand, season))
            }
        }
    }

    async fn generate_email(&self, blog_title: &str, topic: &str, season: &SeasonalContext) -> GeneratedArtifact {
        let prompt = prompts::email(blog_title, topic, &self.config.brand, season);
        match self.generate_nonempty(&prompt).await {
            Some(served) => GeneratedArtifact::generated(served.value, served.provider),
            None => {
                warn!("Email generation failed, using template");
                GeneratedArtifact::template(templates::email(blog_title, &self.config.brand, season))
            }
        }
    }

    async fn generate_nonempty(&self, prompt: &str) -> Option<Served<String>> {
        let generator = self.generator.as_ref();
        self.executor
            .execute(&self.config.content_providers, |p| {
                let model = p.identifier.clone();
                async move {
                    let text = generator.generate(&model, prompt).await?;
                    let text = text.trim().to_string();
                    if text.is_empty() {
                        return Err(ProviderFailure::transient("empty response"));
                    }
                    Ok(text)
                }
            })
            .await
            .ok()
    }

    async fn publish_all(&self, content: &CampaignContent) -> BTreeMap<String, PublishOutcome> {
        let mut outcomes = BTreeMap::new();
        for target in &self.targets {
            let platform = target.platform().to_string();
            let outcome = target.publish(content).await;
            if outcome.success {
                info!(platform = %platform, id = ?outcome.identifier, "Published");
            } else {
                warn!(platform = %platform, error = ?outcome.error, "Publish failed");
            }
            outcomes.insert(platform, outcome);
        }
        outcomes
    }
}
