use std::path::{Path, PathBuf};

use async_trait::async_trait;
use campaign_engine::content::slugify;
use campaign_engine::{render_json_ld, CampaignContent, PublishOutcome, PublishTarget};
use chrono::{NaiveDate, Utc};
use llm_client::extract_domain;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::{FacebookConfig, ShopifyConfig};

const SHOPIFY_API_VERSION: &str = "2024-01";
const GRAPH_API_VERSION: &str = "v18.0";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
/// Error bodies are cut to this many characters in outcomes
const MAX_ERROR_BODY_CHARS: usize = 200;

async fn failure_from_response(platform: &str, res: reqwest::Response) -> PublishOutcome {
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
    PublishOutcome::failed(format!("{} returned {}: {}", platform, status.as_u16(), body))
}

// --- Shopify ---

#[derive(Deserialize)]
struct ShopifyArticleResponse {
    article: ShopifyArticle,
}

#[derive(Deserialize)]
struct ShopifyArticle {
    id: u64,
}

/// Publishes the blog post as a Shopify store article.
pub struct ShopifyBlogTarget {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    blog_id: String,
}

impl ShopifyBlogTarget {
    pub fn new(http: reqwest::Client, config: &ShopifyConfig) -> Self {
        Self {
            http,
            base_url: format!("https://{}", config.shop),
            access_token: config.access_token.clone(),
            blog_id: config.blog_id.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn try_publish(&self, content: &CampaignContent) -> Result<PublishOutcome, reqwest::Error> {
        let url = format!(
            "{}/admin/api/{}/blogs/{}/articles.json",
            self.base_url, SHOPIFY_API_VERSION, self.blog_id
        );
        let body_html = if content.schemas.is_empty() {
            content.blog.content.clone()
        } else {
            format!("{}\n\n<!-- Schema Markup -->\n{}", content.blog.content, render_json_ld(&content.schemas))
        };
        let body = json!({
            "article": {
                "title": content.blog.title,
                "body_html": body_html,
                "tags": content.blog.tags.join(", "),
                "published": true,
                "metafields": [{
                    "namespace": "seo",
                    "key": "description",
                    "value": content.blog.meta_description,
                    "type": "single_line_text_field",
                }],
            }
        });

        let res = self.http.post(&url)
            .header("X-Shopify-Access-Token", &self.access_token)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            return Ok(failure_from_response("Shopify", res).await);
        }
        let created: ShopifyArticleResponse = res.json().await?;
        Ok(PublishOutcome::published(created.article.id.to_string()))
    }
}

#[async_trait]
impl PublishTarget for ShopifyBlogTarget {
    fn platform(&self) -> &str {
        "shopify"
    }

    #[instrument(skip(self, content), fields(domain = %extract_domain(&self.base_url)))]
    async fn publish(&self, content: &CampaignContent) -> PublishOutcome {
        self.try_publish(content)
            .await
            .unwrap_or_else(|e| PublishOutcome::failed(format!("Shopify request failed: {}", e)))
    }
}

// --- Facebook ---

#[derive(Deserialize)]
struct GraphPostResponse {
    id: String,
}

/// Posts the social caption to a Facebook page feed.
pub struct FacebookPageTarget {
    http: reqwest::Client,
    base_url: String,
    page_id: String,
    page_token: String,
}

impl FacebookPageTarget {
    pub fn new(http: reqwest::Client, config: &FacebookConfig) -> Self {
        Self {
            http,
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            page_id: config.page_id.clone(),
            page_token: config.page_token.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn try_publish(&self, content: &CampaignContent) -> Result<PublishOutcome, reqwest::Error> {
        let url = format!("{}/{}/{}/feed", self.base_url, GRAPH_API_VERSION, self.page_id);
        let body = json!({
            "message": content.social_caption,
            "access_token": self.page_token,
        });

        let res = self.http.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            return Ok(failure_from_response("Facebook", res).await);
        }
        let post: GraphPostResponse = res.json().await?;
        Ok(PublishOutcome::published(post.id))
    }
}

#[async_trait]
impl PublishTarget for FacebookPageTarget {
    fn platform(&self) -> &str {
        "facebook"
    }

    #[instrument(skip(self, content), fields(page = %self.page_id))]
    async fn publish(&self, content: &CampaignContent) -> PublishOutcome {
        self.try_publish(content)
            .await
            .unwrap_or_else(|e| PublishOutcome::failed(format!("Facebook request failed: {}", e)))
    }
}

// --- Local archive ---

#[derive(Serialize)]
struct SocialArchive<'a> {
    topic: &'a str,
    blog_title: &'a str,
    caption: &'a str,
}

/// Writes every artifact under a local directory: a Jekyll-style post, the
/// social caption as JSON and the email as plain text.
pub struct LocalArchiveTarget {
    root: PathBuf,
    date: Option<NaiveDate>,
}

impl LocalArchiveTarget {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), date: None }
    }

    /// Pin the date used in file names instead of today's.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn blog_path(&self, date: NaiveDate, topic: &str) -> PathBuf {
        self.root.join("_posts").join(format!("{}-{}.md", date, slugify(topic)))
    }

    async fn write(path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, contents).await
    }

    async fn try_publish(&self, content: &CampaignContent) -> Result<PathBuf, Box<dyn std::error::Error + Send + Sync>> {
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());
        let blog = &content.blog;

        let front_matter = format!(
            "---\nlayout: post\ntitle: {}\ndescription: {}\ndate: {}\ntags: [{}]\n---\n\n",
            serde_json::to_string(&blog.title)?,
            serde_json::to_string(&blog.meta_description)?,
            date,
            blog.tags.join(", ")
        );
        let blog_path = self.blog_path(date, &content.topic);
        Self::write(&blog_path, format!("{}{}\n", front_matter, blog.content).as_bytes()).await?;

        let social = SocialArchive {
            topic: &content.topic,
            blog_title: &blog.title,
            caption: &content.social_caption,
        };
        let social_path = self.root.join("content").join(format!("social-{}.json", date));
        Self::write(&social_path, &serde_json::to_vec_pretty(&social)?).await?;

        let email_path = self.root.join("emails").join(format!("email-{}.txt", date));
        Self::write(&email_path, content.email.as_bytes()).await?;

        debug!(blog = %blog_path.display(), social = %social_path.display(), email = %email_path.display(), "Archived campaign");
        Ok(blog_path)
    }
}

#[async_trait]
impl PublishTarget for LocalArchiveTarget {
    fn platform(&self) -> &str {
        "archive"
    }

    #[instrument(skip(self, content), fields(root = %self.root.display()))]
    async fn publish(&self, content: &CampaignContent) -> PublishOutcome {
        match self.try_publish(content).await {
            Ok(path) => PublishOutcome::published(path.display().to_string()),
            Err(e) => PublishOutcome::failed(format!("archive write failed: {}", e)),
        }
    }
}
