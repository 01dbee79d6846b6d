//! schema.org JSON-LD documents embedded alongside a published blog post.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::config::BrandConfig;
use crate::content::BlogPost;

/// BlogPosting, Product and FAQPage documents for one post.
pub fn schema_markup(post: &BlogPost, brand: &BrandConfig, published: DateTime<Utc>) -> Vec<Value> {
    let date = published.format("%Y-%m-%d").to_string();
    let organization = json!({ "@type": "Organization", "name": brand.name });

    let blog_posting = json!({
        "@context": "https://schema.org",
        "@type": "BlogPosting",
        "headline": post.title,
        "description": post.meta_description,
        "keywords": post.tags.join(", "),
        "author": organization,
        "publisher": { "@type": "Organization", "name": brand.name, "url": brand.website },
        "datePublished": date,
        "dateModified": date,
    });

    let product = json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": format!("{} Voice Message Sticker", brand.name),
        "description": brand.product,
        "brand": { "@type": "Brand", "name": brand.name },
        "offers": {
            "@type": "Offer",
            "price": numeric_price(&brand.price),
            "priceCurrency": brand.currency,
            "availability": "https://schema.org/InStock",
            "url": brand.website,
        },
    });

    let faq = json!({
        "@context": "https://schema.org",
        "@type": "FAQPage",
        "mainEntity": [
            question(
                &format!("How much does {} cost?", brand.name),
                &format!("{} pricing: {}.", brand.name, brand.pricing_summary),
            ),
            question(
                &format!("Do I need an app to use {}?", brand.name),
                &format!(
                    "No. {} works without any app. {} Recipients tap the sticker with their phone to play the message.",
                    brand.name, brand.tagline
                ),
            ),
            question(
                "How long can I record?",
                "You can record up to 60 seconds of audio or 30 seconds of video.",
            ),
        ],
    });

    vec![blog_posting, product, faq]
}

/// `<script type="application/ld+json">` blocks ready to append to post HTML.
pub fn render_json_ld(schemas: &[Value]) -> String {
    schemas
        .iter()
        .map(|schema| {
            let body = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
            format!("<script type=\"application/ld+json\">\n{}\n</script>", body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn question(name: &str, answer: &str) -> Value {
    json!({
        "@type": "Question",
        "name": name,
        "acceptedAnswer": { "@type": "Answer", "text": answer },
    })
}

/// "£8.99" -> "8.99"
fn numeric_price(price: &str) -> String {
    price.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}
