use std::error::Error;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use atom_syndication::Feed;
use campaign_engine::{TrendFetcher, TrendHit};
use futures::future::join_all;
use llm_client::extract_domain;
use rss::Channel;
use select::document::Document;
use select::predicate::{Class, Name, Predicate};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::SourceConfig;

/// HTTP timeout for fetching feeds and search pages
const FETCH_TIMEOUT_SECS: u64 = 30;
/// Maximum number of items taken from each feed
const MAX_ITEMS_PER_FEED: usize = 5;
/// Maximum number of results taken from one search page
const MAX_SEARCH_RESULTS: usize = 10;
const SNIPPET_CHARS: usize = 300;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://html.duckduckgo.com";

/// Create a shared HTTP client with configured timeout
pub fn create_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(StdDuration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(concat!("campaign-agent/", env!("CARGO_PKG_VERSION")))
        .build()
}

fn snippet(text: &str) -> String {
    let plain = Document::from(text)
        .find(Name("body"))
        .next()
        .map(|body| body.text())
        .unwrap_or_else(|| text.to_string());
    plain
        .split_whitespace().collect::<Vec<_>>().join(" ").chars().take(SNIPPET_CHARS).collect()
}

/// Parse a feed body as RSS, then as Atom.
pub fn parse_feed(content: &[u8], source_name: &str) -> Result<Vec<TrendHit>, Box<dyn Error + Send + Sync>> {
    if let Ok(channel) = Channel::read_from(content) {
        let hits = channel
            .items()
            .iter()
            .filter_map(|item| {
                let title = item.title()?.trim();
                (!title.is_empty()).then(|| TrendHit {
                    title: title.to_string(),
                    snippet: item.description().map(snippet).unwrap_or_default(),
                    url: item.link().unwrap_or_default().to_string(),
                })
            })
            .take(MAX_ITEMS_PER_FEED)
            .collect();
        return Ok(hits);
    }

    let feed = Feed::read_from(content)
        .map_err(|e| format!("'{}' is neither RSS nor Atom: {}", source_name, e))?;

    let mut entries: Vec<_> = feed.entries().iter().collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.published().copied().unwrap_or(*e.updated())));

    Ok(entries
        .into_iter()
        .filter(|entry| !entry.title().value.trim().is_empty())
        .take(MAX_ITEMS_PER_FEED)
        .map(|entry| TrendHit {
            title: entry.title().value.trim().to_string(),
            snippet: entry.summary().map(|s| snippet(&s.value)).unwrap_or_default(),
            url: entry.links().first().map(|l| l.href().to_string()).unwrap_or_default(),
        })
        .collect())
}

/// Latest headlines from a fixed list of feeds. Feeds are not query-driven, so
/// every query returns the same items; the orchestrator de-duplicates them.
pub struct FeedTrendFetcher {
    http: reqwest::Client,
    sources: Vec<SourceConfig>,
}

impl FeedTrendFetcher {
    pub fn new(http: reqwest::Client, sources: Vec<SourceConfig>) -> Self {
        Self { http, sources }
    }

    #[instrument(skip(self, source), fields(source = %source.name, domain = %extract_domain(&source.url)))]
    async fn fetch_source(&self, source: &SourceConfig) -> Result<Vec<TrendHit>, Box<dyn Error + Send + Sync>> {
        let content = self.http.get(&source.url).send().await?.error_for_status()?.bytes().await?;
        parse_feed(&content[..], &source.name)
    }
}

#[async_trait]
impl TrendFetcher for FeedTrendFetcher {
    async fn search(&self, _query: &str) -> Vec<TrendHit> {
        let results = join_all(self.sources.iter().map(|s| self.fetch_source(s))).await;

        let mut hits = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(mut found) => {
                    debug!(source = %source.name, count = found.len(), "Fetched feed items");
                    hits.append(&mut found);
                }
                Err(e) => warn!(source = %source.name, error = %e, "Failed to fetch feed"),
            }
        }
        hits
    }
}

/// Parse a DuckDuckGo HTML results page.
pub fn parse_search_results(html: &str) -> Vec<TrendHit> {
    let document = Document::from(html);
    document
        .find(Class("result"))
        .filter_map(|result| {
            let link = result.find(Name("a").and(Class("result__a"))).next()?;
            let title = link.text().trim().to_string();
            if title.is_empty() {
                return None;
            }
            let snippet = result
                .find(Class("result__snippet"))
                .next()
                .map(|s| s.text().split_whitespace().collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            Some(TrendHit {
                title,
                snippet,
                url: link.attr("href").map(resolve_result_link).unwrap_or_default(),
            })
        })
        .take(MAX_SEARCH_RESULTS)
        .collect()
}

/// DuckDuckGo wraps result links in a redirect (`/l/?uddg=<target>`).
fn resolve_result_link(href: &str) -> String {
    let absolute = if href.starts_with("//") { format!("https:{}", href) } else { href.to_string() };
    Url::parse(&absolute)
        .ok()
        .and_then(|u| u.query_pairs().find(|(k, _)| k == "uddg").map(|(_, v)| v.into_owned()))
        .unwrap_or(absolute)
}

/// Free web search through the DuckDuckGo HTML endpoint.
pub struct WebSearchFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl WebSearchFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http, base_url: DEFAULT_SEARCH_BASE_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, query: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}/html/", self.base_url))?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<TrendHit>, Box<dyn Error + Send + Sync>> {
        let url = self.search_url(query)?;
        let html = self.http.get(url).send().await?.error_for_status()?.text().await?;
        Ok(parse_search_results(&html))
    }
}

#[async_trait]
impl TrendFetcher for WebSearchFetcher {
    #[instrument(skip(self))]
    async fn search(&self, query: &str) -> Vec<TrendHit> {
        match self.fetch(query).await {
            Ok(hits) => {
                debug!(count = hits.len(), "Search results");
                hits
            }
            Err(e) => {
                warn!(error = %e, "Web search failed");
                Vec::new()
            }
        }
    }
}

/// Concatenates the results of several fetchers, in order.
pub struct CompositeTrendFetcher {
    fetchers: Vec<Arc<dyn TrendFetcher>>,
}

impl CompositeTrendFetcher {
    pub fn new(fetchers: Vec<Arc<dyn TrendFetcher>>) -> Self {
        Self { fetchers }
    }
}

#[async_trait]
impl TrendFetcher for CompositeTrendFetcher {
    async fn search(&self, query: &str) -> Vec<TrendHit> {
        let mut hits = Vec::new();
        for fetcher in &self.fetchers {
            hits.extend(fetcher.search(query).await);
        }
        hits
    }
}
