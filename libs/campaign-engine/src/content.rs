use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::BrandConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    Blog,
    SocialCaption,
    Email,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Blog => "blog",
            ArtifactKind::SocialCaption => "social-caption",
            ArtifactKind::Email => "email",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum ArtifactOrigin {
    Generated { provider: String },
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedArtifact {
    pub text: String,
    #[serde(flatten)]
    pub origin: ArtifactOrigin,
}

impl GeneratedArtifact {
    pub fn generated(text: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: ArtifactOrigin::Generated { provider: provider.into() },
        }
    }

    pub fn template(text: impl Into<String>) -> Self {
        Self { text: text.into(), origin: ArtifactOrigin::Template }
    }

    pub fn is_template(&self) -> bool {
        self.origin == ArtifactOrigin::Template
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub title: String,
    pub meta_description: String,
    pub tags: Vec<String>,
    pub content: String,
}

fn header_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let stripped = line.trim().trim_start_matches(['*', '#', ' ']);
    let rest = stripped.strip_prefix(key)?;
    Some(rest.trim_start_matches('*').trim())
}

/// Split generated text with `Title:` / `Meta Description:` / `Tags:` header
/// lines into a [`BlogPost`]. Missing headers get brand defaults.
pub fn parse_blog_post(text: &str, brand: &BrandConfig) -> BlogPost {
    let lines: Vec<&str> = text.trim().lines().collect();

    let mut title = String::new();
    let mut meta_description = String::new();
    let mut tags = Vec::new();
    let mut content_start = 0;

    for (i, line) in lines.iter().enumerate() {
        if let Some(v) = header_value(line, "Title:") {
            title = v.trim_matches('"').to_string();
            content_start = i + 1;
        } else if let Some(v) = header_value(line, "Meta Description:") {
            meta_description = v.to_string();
            content_start = i + 1;
        } else if let Some(v) = header_value(line, "Tags:") {
            tags = v
                .trim_matches(['[', ']'])
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            content_start = i + 1;
            break;
        }
    }

    let content = lines[content_start.min(lines.len())..].join("\n").trim().to_string();

    if title.is_empty() {
        title = format!("Voice Message Gifts - Ultimate Guide | {}", brand.name);
    }
    if meta_description.is_empty() {
        meta_description = format!(
            "{} Add personal voice messages to gifts from {}. No app needed!",
            brand.tagline, brand.price
        );
    }
    if tags.is_empty() {
        tags = brand.default_tags.clone();
    }

    BlogPost { title, meta_description, tags, content }
}

/// Result of parsing structured data out of free-form model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutput<T> {
    Parsed(T),
    Malformed(String),
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

fn outer_block(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Extract a JSON object (or array) embedded in conversational text.
pub fn parse_json_block<T: DeserializeOwned>(text: &str) -> LlmOutput<T> {
    let body = strip_code_fence(text);

    if let Ok(value) = serde_json::from_str(body) {
        return LlmOutput::Parsed(value);
    }
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(block) = outer_block(body, open, close) {
            if let Ok(value) = serde_json::from_str(block) {
                return LlmOutput::Parsed(value);
            }
        }
    }
    LlmOutput::Malformed(text.to_string())
}

/// Themes and keywords extracted from research hits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TrendAnalysis {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
}

/// "voice message gifts" -> "Voice Message Gifts"
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Lower-case, hyphen-separated slug of at most 50 characters.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    slug.chars().take(50).collect::<String>().trim_end_matches('-').to_string()
}
