use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{
    clamp_score, normalize_keyword, ChannelProfile, ContentStyle, ContentStyleKind,
    TargetAudience, TrendSignal,
};

pub const NEUTRAL_SCORE: f64 = 50.0;
pub const TOPIC_RELEVANCE_FLOOR: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub viral_potential: f64,
    pub topic_relevance: f64,
    pub style_compatibility: f64,
    pub audience_fit: f64,
}

impl SubScores {
    pub fn compute(trend: &TrendSignal, channel: &ChannelProfile) -> Self {
        let keyword = trend.keyword.as_str();
        Self {
            viral_potential: viral_potential(trend),
            topic_relevance: topic_relevance(keyword, &channel.topic_labels()),
            style_compatibility: style_compatibility(keyword, channel.content_style.as_ref()),
            audience_fit: audience_fit(keyword, channel.target_audience.as_ref()),
        }
    }

    /// Content relevance: 50% topic, 30% style, 20% audience.
    pub fn relevance_blend(&self) -> f64 {
        clamp_score(
            self.topic_relevance * 0.5 + self.style_compatibility * 0.3 + self.audience_fit * 0.2,
        )
    }
}

pub fn viral_potential(trend: &TrendSignal) -> f64 {
    let base = trend.composite();
    let growth_bonus = (trend.growth_rate * 0.3).min(30.0);
    let platform_bonus = ((trend.source_count() as f64 - 1.0) * 10.0).min(20.0);
    clamp_score(base + growth_bonus + platform_bonus)
}

pub fn topic_relevance(keyword: &str, channel_topics: &[String]) -> f64 {
    let topics: Vec<String> = channel_topics
        .iter()
        .map(|topic| normalize_keyword(topic))
        .filter(|topic| !topic.is_empty())
        .collect();
    if topics.is_empty() {
        return NEUTRAL_SCORE;
    }

    let keyword = normalize_keyword(keyword);
    let keyword_words: HashSet<&str> = keyword.split_whitespace().collect();

    let mut exact_matches = 0usize;
    let mut word_overlap = 0usize;
    for topic in &topics {
        if keyword.contains(topic.as_str()) {
            exact_matches += 1;
        }
        let topic_words: HashSet<&str> = topic.split_whitespace().collect();
        word_overlap += keyword_words.intersection(&topic_words).count();
    }

    let relevance = (exact_matches * 20 + word_overlap * 10) as f64;
    relevance.clamp(TOPIC_RELEVANCE_FLOOR, 100.0)
}

pub fn style_compatibility(keyword: &str, style: Option<&ContentStyle>) -> f64 {
    let Some(style) = style else {
        return NEUTRAL_SCORE;
    };
    let keyword = normalize_keyword(keyword);
    let matches = style_keywords(style.primary_style)
        .iter()
        .filter(|term| keyword.contains(**term))
        .count();
    clamp_score(NEUTRAL_SCORE + matches as f64 * 15.0)
}

pub fn audience_fit(keyword: &str, audience: Option<&TargetAudience>) -> f64 {
    let Some(audience) = audience else {
        return NEUTRAL_SCORE;
    };
    let keyword = normalize_keyword(keyword);
    let matches = audience_indicators(&audience.primary_age_group)
        .iter()
        .filter(|term| keyword.contains(**term))
        .count();
    clamp_score(NEUTRAL_SCORE + matches as f64 * 12.0)
}

pub fn style_keywords(style: ContentStyleKind) -> &'static [&'static str] {
    match style {
        ContentStyleKind::Tutorial => &["how", "guide", "tips", "learn", "tutorial"],
        ContentStyleKind::Review => &["review", "unbox", "test", "compare", "vs"],
        ContentStyleKind::Entertainment => &["funny", "challenge", "prank", "reaction"],
        ContentStyleKind::News => &["news", "update", "breaking", "latest"],
        ContentStyleKind::Educational => &["explain", "science", "facts", "history"],
        ContentStyleKind::Gaming => &["game", "gaming", "play", "walkthrough"],
        ContentStyleKind::Tech => &["tech", "gadget", "phone", "software"],
        ContentStyleKind::General => &[],
    }
}

/// Unknown age groups fall back to the all-ages indicators.
pub fn audience_indicators(age_group: &str) -> &'static [&'static str] {
    match normalize_keyword(age_group).as_str() {
        "kids" => &["kids", "fun", "cartoon", "toy", "game"],
        "teens" => &["teen", "tiktok", "viral", "meme", "trend"],
        "young_adults" => &["college", "career", "lifestyle", "tech"],
        "adults" => &["professional", "finance", "business", "investment"],
        _ => &["family", "everyone", "popular", "trending"],
    }
}
