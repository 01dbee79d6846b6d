//! Static artifacts used when every generation provider has failed.

use std::collections::HashSet;

use crate::config::BrandConfig;
use crate::content::{slugify, BlogPost};
use crate::seasonal::SeasonalContext;

pub fn blog_post(topic: &str, brand: &BrandConfig, season: &SeasonalContext) -> BlogPost {
    let title = format!("{} | {} Voice Message Gifts", topic, brand.name);
    let topic_lower = topic.to_lowercase();
    let timing = match season.next_event() {
        Some(event) => format!(
            "With {} only {} days away, now is the perfect time to plan a gift they will replay for years.",
            event.occasion.label(),
            event.days_ahead
        ),
        None => format!(
            "This {} {}, skip the forgettable presents and give something personal.",
            season.season, season.year
        ),
    };

    let content = format!(
        "# {title}\n\n\
         ## Quick Answer\n\n\
         Looking for meaningful {topic_lower}? **{name} voice message stickers** (from {price}) let you add a personal \
         voice or video message to any gift, card, or invitation.\n\n\
         **Why {name}?**\n\
         - No app needed - just tap a phone\n\
         - Voice OR video recording\n\
         - Messages can be downloaded and kept forever\n\
         - Works with any smartphone\n\n\
         ## The Problem With Generic Gifts\n\n\
         Most presents are opened, admired for a moment, and forgotten. What people remember is the feeling behind \
         the gift, and nothing carries feeling like a familiar voice.\n\n\
         ## How {name} Works\n\n\
         1. **Tap**: hold your phone to the sticker and the recorder opens\n\
         2. **Record**: capture your message\n\
         3. **Stick**: attach it to the gift, card or invitation\n\
         4. **Play**: the recipient taps their phone to hear it\n\n\
         ## Pricing\n\n\
         {pricing}\n\n\
         ## Perfect Timing for {season} {year}\n\n\
         {timing}\n\n\
         ## Get Started Today\n\n\
         Visit [{website}]({website}) to order your {name} stickers.\n\n\
         **{tagline}**\n",
        title = title,
        topic_lower = topic_lower,
        name = brand.name,
        price = brand.price,
        pricing = brand.pricing_summary,
        season = season.season,
        year = season.year,
        timing = timing,
        website = brand.website,
        tagline = brand.tagline,
    );

    let mut seen = HashSet::new();
    let tags: Vec<String> = std::iter::once(slugify(topic))
        .chain(brand.default_tags.iter().cloned())
        .filter(|tag| seen.insert(tag.clone()))
        .collect();

    BlogPost {
        title,
        meta_description: format!(
            "Discover {} with {}. Add a personal voice or video message to any gift from {}. No app needed!",
            topic_lower, brand.name, brand.price
        ),
        tags,
        content,
    }
}

fn hashtag(text: &str) -> String {
    text.split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .collect()
}

pub fn social_caption(blog_title: &str, topic: &str, brand: &BrandConfig, season: &SeasonalContext) -> String {
    format!(
        "💝 {title}\n\n\
         Make every gift unforgettable with {name}. {tagline}\n\n\
         Read more: {website}\n\n\
         #{name} #{topic_tag} #{season}{year} #PersonalizedGifts #VoiceGifts",
        title = blog_title,
        name = brand.name,
        tagline = brand.tagline,
        website = brand.website,
        topic_tag = hashtag(topic),
        season = season.season,
        year = season.year,
    )
}

pub fn email(blog_title: &str, brand: &BrandConfig, season: &SeasonalContext) -> String {
    let occasion = season
        .next_event()
        .map(|e| e.occasion.label().to_string())
        .unwrap_or_else(|| format!("{} {}", season.season, season.year));

    format!(
        "SUBJECT: The gift everyone wants this {season}\n\
         PREVIEW: Make {year} unforgettable\n\n\
         Hi there,\n\n\
         What if the best gifts of {year} aren't things at all?\n\n\
         They're moments. Voices. Memories that last forever.\n\n\
         With {occasion} coming up, you're probably thinking about gifts. Our latest guide, \"{title}\", has \
         ideas that people will actually keep.\n\n\
         With {name}, just {price} turns any present into a voice or video message they can replay whenever they \
         want. No app needed.\n\n\
         👉 See how it works: {website}\n\n\
         Make this {season} unforgettable,\n\
         The {name} Team\n\n\
         P.S. {occasion} is coming up fast. Order now and give a gift they'll keep forever.\n",
        season = season.season,
        year = season.year,
        occasion = occasion,
        title = blog_title,
        name = brand.name,
        price = brand.price,
        website = brand.website,
    )
}
