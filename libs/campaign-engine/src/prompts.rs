use crate::collaborators::TrendHit;
use crate::config::BrandConfig;
use crate::seasonal::SeasonalContext;

/// Research hits fed into the analysis prompt.
const MAX_ANALYSIS_HITS: usize = 10;

pub fn trend_analysis(hits: &[TrendHit], brand: &BrandConfig) -> String {
    let trends = hits
        .iter()
        .take(MAX_ANALYSIS_HITS)
        .map(|h| format!("{}: {}", h.title, h.snippet))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze these trending topics and extract:\n\
         1. Top 5 trending themes\n\
         2. Popular keywords\n\
         3. Content opportunities for {name} ({product})\n\n\
         Trends:\n{trends}\n\n\
         Return ONLY JSON in this format:\n\
         {{\"themes\": [\"theme1\", \"theme2\"], \"keywords\": [\"keyword1\"], \"opportunities\": [\"opportunity1\"]}}",
        name = brand.name,
        product = brand.product,
        trends = trends,
    )
}

pub fn blog_post(topic: &str, brand: &BrandConfig, season: &SeasonalContext) -> String {
    format!(
        "Create a comprehensive blog post about: {topic}\n\n\
         PRODUCT CONTEXT:\n\
         - {name}: {product}\n\
         - Prices: {pricing}\n\
         - Tagline: {tagline}\n\
         - Website: {website}\n\
         - Audience: {audience}\n\n\
         MARKET CONTEXT:\n\
         - Season: {season} {year} ({month})\n\
         - Upcoming occasions: {events}\n\
         - Target keywords: {keywords}\n\n\
         REQUIREMENTS:\n\
         - Title with the year {year} and the primary keyword\n\
         - 1200-1500 words, H2 and H3 headers, UK English\n\
         - Quick Answer section in the first 100 words\n\
         - FAQ section with clear Q&A format\n\
         - Specific pricing mentions and a step-by-step how-to\n\
         - Emotional storytelling and a strong call to action\n\n\
         Return the blog post in this format:\n\
         Title: [SEO-optimized title]\n\
         Meta Description: [155 chars max]\n\
         Tags: [tag1, tag2, tag3, tag4, tag5]\n\n\
         [Full blog content in markdown]",
        topic = topic,
        name = brand.name,
        product = brand.product,
        pricing = brand.pricing_summary,
        tagline = brand.tagline,
        website = brand.website,
        audience = brand.target_audience,
        season = season.season,
        year = season.year,
        month = season.month,
        events = season.events_label(),
        keywords = season.keywords().join(", "),
    )
}

pub fn social_caption(blog_title: &str, topic: &str, brand: &BrandConfig, season: &SeasonalContext) -> String {
    format!(
        "Write one Instagram/Facebook caption promoting our new blog post \"{title}\" about {topic}.\n\
         Brand: {name} - {product}. Website: {website}.\n\
         Season: {season} {year}.\n\
         Keep it under 400 characters, warm and emotional, end with 5 relevant hashtags including #{name}.\n\
         Reply with the caption text only.",
        title = blog_title,
        topic = topic,
        name = brand.name,
        product = brand.product,
        website = brand.website,
        season = season.season,
        year = season.year,
    )
}

pub fn email(blog_title: &str, topic: &str, brand: &BrandConfig, season: &SeasonalContext) -> String {
    let occasion = season
        .next_event()
        .map(|e| e.occasion.label().to_string())
        .unwrap_or_else(|| format!("{} {}", season.season, season.year));

    format!(
        "Write a short marketing email for {name} subscribers.\n\
         It should link to our new article \"{title}\" about {topic} and mention {occasion}.\n\
         Product: {product}, from {price}. Website: {website}.\n\
         Format:\n\
         SUBJECT: [subject line]\n\
         PREVIEW: [preview text]\n\n\
         [Email body, under 200 words, signed \"The {name} Team\"]",
        name = brand.name,
        title = blog_title,
        topic = topic,
        occasion = occasion,
        product = brand.product,
        price = brand.price,
        website = brand.website,
    )
}

/// Minimal prompt used to check that a model answers at all.
pub const PROBE: &str = "Hi";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn autumn() -> SeasonalContext {
        SeasonalContext::for_date(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap())
    }

    #[test]
    fn test_blog_prompt_mentions_topic_and_format() {
        let prompt = blog_post("Wedding Gifts", &BrandConfig::default(), &autumn());
        assert!(prompt.contains("Wedding Gifts"));
        assert!(prompt.contains("Meta Description:"));
        assert!(prompt.contains("Autumn 2026"));
    }

    #[test]
    fn test_blog_prompt_targets_seasonal_keywords() {
        let december = SeasonalContext::for_date(NaiveDate::from_ymd_opt(2025, 12, 10).unwrap());
        let prompt = blog_post("Christmas Gifts", &BrandConfig::default(), &december);
        assert!(prompt.contains("Target keywords: christmas gifts 2025"));
        assert!(prompt.contains("unique christmas gifts 2025"));

        let prompt = blog_post("Wedding Gifts", &BrandConfig::default(), &autumn());
        assert!(prompt.contains("birthday gifts 2026"));
    }

    #[test]
    fn test_social_prompt_references_blog_title() {
        let prompt = social_caption("My Title", "Wedding Gifts", &BrandConfig::default(), &autumn());
        assert!(prompt.contains("\"My Title\""));
    }

    #[test]
    fn test_analysis_prompt_limits_hits() {
        let hits: Vec<TrendHit> = (0..20)
            .map(|i| TrendHit { title: format!("hit-{}", i), snippet: String::new(), url: String::new() })
            .collect();
        let prompt = trend_analysis(&hits, &BrandConfig::default());
        assert!(prompt.contains("hit-9"));
        assert!(!prompt.contains("hit-10"));
    }
}
