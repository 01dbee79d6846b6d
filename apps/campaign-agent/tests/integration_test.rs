use std::sync::Arc;
use std::time::Duration;

use campaign_agent::config::{AgentConfig, FacebookConfig, ShopifyConfig, SourceConfig};
use campaign_agent::fetcher::{CompositeTrendFetcher, FeedTrendFetcher, WebSearchFetcher};
use campaign_agent::generator::LlmGenerator;
use campaign_agent::publisher::{FacebookPageTarget, LocalArchiveTarget, ShopifyBlogTarget};
use campaign_engine::{
    schema_markup, BlogPost, BrandConfig, CampaignConfig, CampaignContent, ContentGenerator,
    FailureKind, HistoryStore, JsonHistoryStore, Orchestrator, ProviderSpec, PublishTarget,
    RetryPolicy, TrendFetcher,
};
use chrono::{NaiveDate, TimeZone, Utc};
use llm_client::{LlmClient, LlmProvider};
use reqwest::Client;
use serial_test::serial;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http() -> Client {
    Client::builder().timeout(Duration::from_secs(5)).build().unwrap()
}

fn content() -> CampaignContent {
    let blog = BlogPost {
        title: "Wedding Gifts 2026".to_string(),
        meta_description: "Ideas for the couple".to_string(),
        tags: vec!["wedding".to_string(), "gifts".to_string()],
        content: "# Wedding Gifts\n\nBody".to_string(),
    };
    let published = Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap();
    CampaignContent {
        topic: "Wedding Gifts".to_string(),
        schemas: schema_markup(&blog, &BrandConfig::default(), published),
        blog,
        social_caption: "New guide! #SayPlay".to_string(),
        email: "SUBJECT: Hi\n\nBody".to_string(),
    }
}

fn gemini_body(text: &str) -> serde_json::Value {
    serde_json::json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
}

// --- LLM generator ---

#[tokio::test]
async fn test_gemini_generation_through_generator() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body("Mocked Gemini Response")))
        .mount(&mock_server)
        .await;

    let client = LlmClient::new(http(), LlmProvider::Gemini, "test-key").with_base_url(mock_server.uri());
    let generator = LlmGenerator::new(client);

    let result = generator.generate("gemini-2.5-flash", "Hello").await;
    assert_eq!(result.unwrap(), "Mocked Gemini Response");
}

#[tokio::test]
async fn test_http_statuses_classified_for_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/busy:generateContent"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gone:generateContent"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such model"))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/broken:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&mock_server)
        .await;

    let client = LlmClient::new(http(), LlmProvider::Gemini, "k").with_base_url(mock_server.uri());
    let generator = LlmGenerator::new(client);

    assert_eq!(generator.generate("busy", "p").await.unwrap_err().kind, FailureKind::RateLimited);
    assert_eq!(generator.generate("gone", "p").await.unwrap_err().kind, FailureKind::NotFound);
    assert_eq!(generator.generate("broken", "p").await.unwrap_err().kind, FailureKind::Transient);
}

#[tokio::test]
async fn test_openai_api_mocking() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Mocked OpenAI Response" } }]
        })))
        .mount(&mock_server)
        .await;

    let client = LlmClient::new(http(), LlmProvider::OpenAI, "test-key").with_base_url(mock_server.uri());
    let result = client.generate("gpt-4o-mini", "Hello").await;
    assert_eq!(result.unwrap(), "Mocked OpenAI Response");
}

#[tokio::test]
async fn test_claude_api_mocking() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": [{ "type": "text", "text": "Mocked Claude Response" }]
        })))
        .mount(&mock_server)
        .await;

    let client = LlmClient::new(http(), LlmProvider::Claude, "test-key").with_base_url(mock_server.uri());
    let result = client.generate("claude-3-5-haiku-latest", "Hello").await;
    assert_eq!(result.unwrap(), "Mocked Claude Response");
}

// --- Publishers ---

#[tokio::test]
async fn test_shopify_article_created() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/blogs/42/articles.json"))
        .and(header("X-Shopify-Access-Token", "shop-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "article": { "id": 123, "title": "Wedding Gifts 2026" }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ShopifyConfig {
        shop: "store.myshopify.com".to_string(),
        access_token: "shop-token".to_string(),
        blog_id: "42".to_string(),
    };
    let target = ShopifyBlogTarget::new(http(), &config).with_base_url(mock_server.uri());

    let outcome = target.publish(&content()).await;
    assert!(outcome.success);
    assert_eq!(outcome.identifier.as_deref(), Some("123"));
}

#[tokio::test]
async fn test_shopify_article_embeds_schema_markup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/blogs/42/articles.json"))
        .and(body_string_contains("<!-- Schema Markup -->"))
        .and(body_string_contains(r#"<script type=\"application/ld+json\">"#))
        .and(body_string_contains(r#"\"@type\": \"BlogPosting\""#))
        .and(body_string_contains(r#"\"@type\": \"FAQPage\""#))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "article": { "id": 7 } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ShopifyConfig {
        shop: "store.myshopify.com".to_string(),
        access_token: "shop-token".to_string(),
        blog_id: "42".to_string(),
    };
    let target = ShopifyBlogTarget::new(http(), &config).with_base_url(mock_server.uri());

    let outcome = target.publish(&content()).await;
    assert!(outcome.success, "{:?}", outcome.error);
}

#[tokio::test]
async fn test_shopify_body_is_plain_without_schemas() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "article": { "body_html": "# Wedding Gifts\n\nBody" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "article": { "id": 8 } })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ShopifyConfig {
        shop: "store.myshopify.com".to_string(),
        access_token: "shop-token".to_string(),
        blog_id: "42".to_string(),
    };
    let target = ShopifyBlogTarget::new(http(), &config).with_base_url(mock_server.uri());

    let mut plain = content();
    plain.schemas.clear();
    let outcome = target.publish(&plain).await;
    assert!(outcome.success, "{:?}", outcome.error);
}

#[tokio::test]
async fn test_shopify_rejection_is_a_failed_outcome() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key or access token"))
        .mount(&mock_server)
        .await;

    let config = ShopifyConfig {
        shop: "store.myshopify.com".to_string(),
        access_token: "wrong".to_string(),
        blog_id: "42".to_string(),
    };
    let target = ShopifyBlogTarget::new(http(), &config).with_base_url(mock_server.uri());

    let outcome = target.publish(&content()).await;
    assert!(!outcome.success);
    let error = outcome.error.unwrap();
    assert!(error.contains("401"));
    assert!(error.contains("Invalid API key"));
}

#[tokio::test]
async fn test_facebook_post_created() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v18.0/page-1/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "page-1_99" })))
        .mount(&mock_server)
        .await;

    let config = FacebookConfig { page_id: "page-1".to_string(), page_token: "fb".to_string() };
    let target = FacebookPageTarget::new(http(), &config).with_base_url(mock_server.uri());

    let outcome = target.publish(&content()).await;
    assert_eq!(outcome.identifier.as_deref(), Some("page-1_99"));
}

#[tokio::test]
async fn test_unreachable_platform_is_a_failed_outcome() {
    let config = FacebookConfig { page_id: "p".to_string(), page_token: "t".to_string() };
    let target = FacebookPageTarget::new(http(), &config).with_base_url("http://127.0.0.1:1");

    let outcome = target.publish(&content()).await;
    assert!(!outcome.success);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn test_local_archive_writes_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
    let target = LocalArchiveTarget::new(dir.path()).with_date(date);

    let outcome = target.publish(&content()).await;
    assert!(outcome.success);

    let blog_path = dir.path().join("_posts/2026-10-14-wedding-gifts.md");
    assert_eq!(outcome.identifier.as_deref(), Some(blog_path.display().to_string().as_str()));
    let blog = std::fs::read_to_string(&blog_path).unwrap();
    assert!(blog.starts_with("---\nlayout: post\ntitle: \"Wedding Gifts 2026\""));
    assert!(blog.contains("tags: [wedding, gifts]"));
    assert!(blog.contains("# Wedding Gifts\n\nBody"));

    let social: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("content/social-2026-10-14.json")).unwrap()).unwrap();
    assert_eq!(social["caption"], "New guide! #SayPlay");

    let email = std::fs::read_to_string(dir.path().join("emails/email-2026-10-14.txt")).unwrap();
    assert!(email.starts_with("SUBJECT: Hi"));
}

// --- Trend fetchers ---

const SEARCH_PAGE: &str = r#"<html><body>
    <div class="result">
      <a class="result__a" href="https://gifts.example/voice">Personalised Voice Gifts Are Trending</a>
      <a class="result__snippet">Shoppers want sentimental presents</a>
    </div>
</body></html>"#;

#[tokio::test]
async fn test_web_search_against_mock() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "voice gifts"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&mock_server)
        .await;

    let fetcher = WebSearchFetcher::new(http()).with_base_url(mock_server.uri());
    let hits = fetcher.search("voice gifts").await;

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "https://gifts.example/voice");
    assert_eq!(hits[0].snippet, "Shoppers want sentimental presents");
}

#[tokio::test]
async fn test_failing_sources_are_skipped() {
    let mock_server = MockServer::start().await;

    let rss = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title><link>https://x</link><description>d</description>
        <item><title>Gift Trend</title><link>https://x/1</link></item></channel></rss>"#;
    Mock::given(method("GET"))
        .and(path("/good.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bad.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let sources = vec![
        SourceConfig { name: "bad".to_string(), source_type: "rss".to_string(), url: format!("{}/bad.xml", mock_server.uri()) },
        SourceConfig { name: "good".to_string(), source_type: "rss".to_string(), url: format!("{}/good.xml", mock_server.uri()) },
    ];
    let composite = CompositeTrendFetcher::new(vec![
        Arc::new(FeedTrendFetcher::new(http(), sources)) as Arc<dyn TrendFetcher>,
        Arc::new(WebSearchFetcher::new(http()).with_base_url(mock_server.uri())),
    ]);

    let hits = composite.search("anything").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Gift Trend");
}

// --- Configuration ---

const AGENT_VARS: &[&str] = &[
    "LLM_PROVIDER",
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
    "LLM_MODELS",
    "SHOPIFY_SHOP",
    "SHOPIFY_ACCESS_TOKEN",
    "SHOPIFY_BLOG_ID",
    "NOVELTY_DAYS",
];

fn clear_agent_env() {
    for key in AGENT_VARS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    clear_agent_env();
    std::env::set_var("LLM_PROVIDER", "openai");
    std::env::set_var("OPENAI_API_KEY", "sk-test");
    std::env::set_var("LLM_MODELS", "gpt-4o,gpt-4o-mini");
    std::env::set_var("SHOPIFY_SHOP", "store.myshopify.com");
    std::env::set_var("SHOPIFY_ACCESS_TOKEN", "t");
    std::env::set_var("SHOPIFY_BLOG_ID", "9");
    std::env::set_var("NOVELTY_DAYS", "3");

    let config = AgentConfig::from_env().unwrap();
    clear_agent_env();

    assert_eq!(config.llm_provider, LlmProvider::OpenAI);
    assert_eq!(config.llm_api_key, "sk-test");
    assert_eq!(config.models, vec!["gpt-4o", "gpt-4o-mini"]);
    assert_eq!(config.shopify.unwrap().blog_id, "9");
    assert_eq!(config.novelty_days, 3);
}

#[test]
#[serial]
fn test_from_env_requires_api_key() {
    clear_agent_env();
    assert!(AgentConfig::from_env().is_err());
}

// --- End to end ---

fn generated_blog() -> String {
    format!(
        "Title: Voice Gifts Guide 2026\nMeta Description: Gifts with a voice\nTags: voice gifts, trending\n\n## Quick Answer\n\n{}",
        "Record a message and stick it on the present. ".repeat(15)
    )
}

#[tokio::test]
async fn test_full_cycle_against_mocked_services() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path_regex(r"^/v1beta/models/.+:generateContent$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_body(&generated_blog())))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-01/blogs/1/articles.json"))
        .and(body_string_contains("BlogPosting"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "article": { "id": 555 } })))
        .mount(&mock_server)
        .await;

    let llm = LlmClient::new(http(), LlmProvider::Gemini, "k").with_base_url(mock_server.uri());
    let shopify = ShopifyConfig { shop: "s".to_string(), access_token: "t".to_string(), blog_id: "1".to_string() };
    let targets: Vec<Arc<dyn PublishTarget>> = vec![
        Arc::new(ShopifyBlogTarget::new(http(), &shopify).with_base_url(mock_server.uri())),
        Arc::new(LocalArchiveTarget::new(dir.path())),
    ];
    let history = Arc::new(JsonHistoryStore::new(dir.path().join("content_history.json"), chrono::Duration::days(7)));

    let config = CampaignConfig {
        research_queries: vec!["voice gifts".to_string()],
        content_providers: ProviderSpec::ordered(["gemini-2.5-flash"]),
        retry: RetryPolicy {
            backoff_base: Duration::ZERO,
            transient_wait: Duration::ZERO,
            ..RetryPolicy::default()
        },
        ..CampaignConfig::default()
    };
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(WebSearchFetcher::new(http()).with_base_url(mock_server.uri())),
        Arc::new(LlmGenerator::new(llm)),
        targets,
        history.clone(),
    )
    .unwrap();

    let result = orchestrator.run_cycle().await.unwrap();

    assert_eq!(result.selected_topic.text, "Personalised Voice Gifts Are Trending");
    assert_eq!(result.blog.title, "Voice Gifts Guide 2026");
    assert_eq!(result.template_artifacts().count(), 0);
    assert_eq!(result.publish_outcomes["shopify"].identifier.as_deref(), Some("555"));
    assert!(result.publish_outcomes["archive"].success);

    let recorded = history.load().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].topic, "Personalised Voice Gifts Are Trending");
    assert!(recorded[0].platforms.contains("shopify"));
    assert!(recorded[0].platforms.contains("archive"));
    assert!(recorded[0].keywords.contains("voice gifts"));
}
