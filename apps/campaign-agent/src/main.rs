use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use campaign_agent::config::AgentConfig;
use campaign_agent::fetcher::{self, CompositeTrendFetcher, FeedTrendFetcher, WebSearchFetcher};
use campaign_agent::generator::LlmGenerator;
use campaign_agent::publisher::{FacebookPageTarget, LocalArchiveTarget, ShopifyBlogTarget};
use campaign_engine::{
    CampaignResult, JsonHistoryStore, Orchestrator, PublishTarget, TrendFetcher,
};
use llm_client::{init_logging, LlmClient};
use tracing::{error, info, warn};

// --- Configuration Constants ---
const LLM_TIMEOUT_SECS: u64 = 60;

fn build_targets(config: &AgentConfig, http: &reqwest::Client) -> Vec<Arc<dyn PublishTarget>> {
    let mut targets: Vec<Arc<dyn PublishTarget>> = Vec::new();

    match &config.shopify {
        Some(shopify) => targets.push(Arc::new(ShopifyBlogTarget::new(http.clone(), shopify))),
        None => warn!("Shopify credentials missing, skipping Shopify"),
    }
    match &config.facebook {
        Some(facebook) => targets.push(Arc::new(FacebookPageTarget::new(http.clone(), facebook))),
        None => warn!("Facebook credentials missing, skipping Facebook"),
    }
    targets.push(Arc::new(LocalArchiveTarget::new(&config.output_dir)));

    targets
}

async fn write_report(output_dir: &Path, result: &CampaignResult) -> std::io::Result<std::path::PathBuf> {
    let dir = output_dir.join("reports");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(format!("daily-{}.txt", result.started_at.format("%Y-%m-%d")));
    tokio::fs::write(&path, format!("{}\n", result)).await?;
    Ok(path)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = AgentConfig::from_env().map_err(|e| {
        error!(error = %e, "Invalid configuration");
        e
    })?;
    let campaign_config = config.campaign_config()?;
    let sources = config.load_sources()?;

    info!(
        provider = %config.llm_provider,
        models = ?config.models,
        history = %config.history_path.display(),
        sources = sources.len(),
        "Starting campaign agent"
    );

    // Shared HTTP clients (reused for connection pooling)
    let llm_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(LLM_TIMEOUT_SECS))
        .build()?;
    let fetch_http = fetcher::create_http_client()?;

    let mut llm = LlmClient::new(llm_http, config.llm_provider, config.llm_api_key.clone());
    if let Some(base_url) = &config.llm_base_url {
        llm = llm.with_base_url(base_url.clone());
    }

    let mut search = WebSearchFetcher::new(fetch_http.clone());
    if let Some(base_url) = &config.search_base_url {
        search = search.with_base_url(base_url.clone());
    }
    let trends = CompositeTrendFetcher::new(vec![
        Arc::new(FeedTrendFetcher::new(fetch_http.clone(), sources)) as Arc<dyn TrendFetcher>,
        Arc::new(search),
    ]);

    let history = JsonHistoryStore::new(&config.history_path, campaign_config.retention);

    let mut orchestrator = Orchestrator::new(
        campaign_config,
        Arc::new(trends),
        Arc::new(LlmGenerator::new(llm)),
        build_targets(&config, &fetch_http),
        Arc::new(history),
    )?;

    if config.probe_models {
        info!("Probing models");
        orchestrator.probe_content_providers().await;
    }

    let result = orchestrator.run_cycle().await.map_err(|e| {
        error!(error = %e, "Campaign cycle failed");
        e
    })?;

    info!("\n{}", result);
    match write_report(&config.output_dir, &result).await {
        Ok(path) => info!(report = %path.display(), "Report saved"),
        Err(e) => warn!(error = %e, "Failed to save report"),
    }

    info!(
        topic = %result.selected_topic.text,
        published = result.successful_platforms().count(),
        "Campaign agent completed"
    );
    Ok(())
}
