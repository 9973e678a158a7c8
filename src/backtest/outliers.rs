use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::backtest::harness::{BacktestRecord, VideoRecord};
use crate::{format_float, format_number, format_percent};

pub const ENGAGEMENT_BASELINE: f64 = 0.005;

const CONTENT_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "this", "that", "from", "your", "you", "are", "was", "were",
    "have", "has", "had", "will", "what", "when", "where", "which", "who", "why", "how", "into",
    "about", "than", "then", "them", "they", "their", "there", "these", "those", "just", "more",
    "most", "some", "such", "only", "over", "very", "also", "can", "not", "but", "out", "all",
    "our", "its", "it's", "here", "watch", "video", "subscribe", "channel",
];

const THEMES: &[(&str, &[&str])] = &[
    ("tutorial", &["how to", "tutorial", "guide", "learn", "teach", "explain"]),
    ("review", &["review", "vs", "compare", "test", "unboxing"]),
    ("entertainment", &["funny", "prank", "challenge", "compilation", "fails"]),
    ("news", &["news", "update", "breaking", "latest", "announcement"]),
    ("tech", &["tech", "gadget", "phone", "laptop", "device"]),
    ("lifestyle", &["vlog", "daily", "life", "routine", "day in"]),
    ("gaming", &["game", "gaming", "gameplay", "walkthrough", "playthrough"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonFactor {
    ViralPotential,
    Relevance,
    ContentKeywords,
    TrendMatch,
    Engagement,
    Overperformance,
    PeerComparison,
    TitleLength,
}

impl ReasonFactor {
    pub fn label(self) -> &'static str {
        match self {
            ReasonFactor::ViralPotential => "internet heat",
            ReasonFactor::Relevance => "content relevance",
            ReasonFactor::ContentKeywords => "content keywords",
            ReasonFactor::TrendMatch => "trend match",
            ReasonFactor::Engagement => "high engagement",
            ReasonFactor::Overperformance => "beat the prediction",
            ReasonFactor::PeerComparison => "period comparison",
            ReasonFactor::TitleLength => "title optimisation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    VeryHigh,
    High,
    Medium,
}

impl ImpactLevel {
    pub fn is_primary(self) -> bool {
        matches!(self, ImpactLevel::VeryHigh | ImpactLevel::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl EngagementLevel {
    pub fn from_rate(rate: f64) -> Self {
        if rate > 0.02 {
            EngagementLevel::VeryHigh
        } else if rate > 0.01 {
            EngagementLevel::High
        } else if rate > 0.005 {
            EngagementLevel::Medium
        } else {
            EngagementLevel::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierReason {
    pub factor: ReasonFactor,
    pub score: f64,
    pub impact: ImpactLevel,
    pub description: String,
    pub actionable_insight: String,
    pub reusable_strategy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentKeyword {
    pub keyword: String,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub top_keywords: Vec<ContentKeyword>,
    pub content_themes: Vec<String>,
    pub quality_score: f64,
    pub title_length: usize,
    pub description_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingTopics {
    pub matched_trends: Vec<String>,
    pub trending_keywords: Vec<String>,
    pub viral_potential: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub like_count: u64,
    pub comment_count: u64,
    pub engagement_rate: f64,
    pub baseline_rate: f64,
    pub engagement_multiplier: f64,
    pub engagement_level: EngagementLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub action: String,
    pub strategy: String,
    pub priority: Priority,
    pub category: ReasonFactor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierExplanation {
    pub reasons: Vec<OutlierReason>,
    pub content_analysis: ContentAnalysis,
    pub trending_topics: TrendingTopics,
    pub engagement: EngagementMetrics,
    pub primary_factors: Vec<ReasonFactor>,
    pub secondary_factors: Vec<ReasonFactor>,
    pub analysis_summary: String,
    pub success_probability: f64,
    pub action_plan: Vec<ActionItem>,
    pub summary: String,
}

impl OutlierExplanation {
    pub fn has_reason(&self, factor: ReasonFactor) -> bool {
        self.reasons.iter().any(|reason| reason.factor == factor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlierAnalysis {
    #[serde(flatten)]
    pub record: BacktestRecord,
    pub explanation: OutlierExplanation,
}

/// Falls back to every video with views when fewer than `limit` are flagged.
pub fn select_top_outliers(
    results: &[BacktestRecord],
    videos: &[&VideoRecord],
    limit: usize,
) -> Vec<OutlierAnalysis> {
    let flagged: Vec<usize> = (0..results.len())
        .filter(|&i| results[i].is_outlier && results[i].actual_views > 0)
        .collect();
    let mut pool = if flagged.len() >= limit {
        flagged
    } else {
        (0..results.len())
            .filter(|&i| results[i].actual_views > 0 && results[i].outlier_ratio > 0.0)
            .collect()
    };

    pool.sort_by(|&a, &b| {
        results[b]
            .outlier_ratio
            .partial_cmp(&results[a].outlier_ratio)
            .unwrap_or(Ordering::Equal)
    });
    pool.truncate(limit);

    pool.into_iter()
        .map(|i| OutlierAnalysis {
            record: results[i].clone(),
            explanation: explain_outlier(&results[i], videos.get(i).copied()),
        })
        .collect()
}

pub fn explain_outlier(record: &BacktestRecord, video: Option<&VideoRecord>) -> OutlierExplanation {
    let description = video.map(VideoRecord::description).unwrap_or("");
    let (likes, comments) = video
        .map(|video| (video.like_count, video.comment_count))
        .unwrap_or((0, 0));

    let content = analyze_content(&record.title, description);
    let trending = trending_topics(record, &content);
    let engagement = engagement_metrics(likes, comments, record.actual_views);
    let reasons = collect_reasons(record, &content, &trending, &engagement);

    let (primary, secondary): (Vec<&OutlierReason>, Vec<&OutlierReason>) =
        reasons.iter().partition(|reason| reason.impact.is_primary());
    let primary_factors: Vec<ReasonFactor> = primary.iter().map(|reason| reason.factor).collect();
    let secondary_factors: Vec<ReasonFactor> = secondary.iter().map(|reason| reason.factor).collect();

    let action_plan = reasons
        .iter()
        .map(|reason| ActionItem {
            action: reason.actionable_insight.clone(),
            strategy: reason.reusable_strategy.clone(),
            priority: if reason.impact.is_primary() {
                Priority::High
            } else {
                Priority::Medium
            },
            category: reason.factor,
        })
        .collect();

    OutlierExplanation {
        analysis_summary: analysis_summary(&primary_factors, &content, &trending, &engagement, record.outlier_ratio),
        success_probability: (50.0 + (record.outlier_ratio - 1.0) * 20.0).min(100.0),
        summary: outlier_summary(record, &reasons),
        primary_factors,
        secondary_factors,
        action_plan,
        reasons,
        content_analysis: content,
        trending_topics: trending,
        engagement,
    }
}

fn collect_reasons(
    record: &BacktestRecord,
    content: &ContentAnalysis,
    trending: &TrendingTopics,
    engagement: &EngagementMetrics,
) -> Vec<OutlierReason> {
    let trend = &record.simulated_trend;
    let mut reasons = Vec::new();

    let viral = trend.viral_potential;
    if viral >= 90.0 {
        reasons.push(reason(
            ReasonFactor::ViralPotential,
            viral,
            ImpactLevel::VeryHigh,
            format!("The topic was extremely hot online at the time ({:.0}/100) and drew wide attention", viral),
            "Watch social trends and publish within 48 hours of a topic peaking",
            "Set up keyword alerts so hot topics can be picked up quickly",
        ));
    } else if viral >= 70.0 {
        reasons.push(reason(
            ReasonFactor::ViralPotential,
            viral,
            ImpactLevel::High,
            format!("The topic was trending at the time ({:.0}/100) with good reach", viral),
            "Track topic momentum and publish while interest is still rising",
            "Review trending topics weekly and prepare related content early",
        ));
    }

    let relevance = trend.relevance_score;
    if relevance >= 80.0 {
        reasons.push(reason(
            ReasonFactor::Relevance,
            relevance,
            ImpactLevel::VeryHigh,
            format!("The content sits squarely in the channel's core topics ({:.0}/100)", relevance),
            "Stay consistent with the channel's positioning and dig into niche angles of core topics",
            "Keep a topic matrix and tie new videos back to the core themes",
        ));
    }

    if !content.top_keywords.is_empty() {
        let keywords = keyword_list(content.top_keywords.iter().take(5).map(|kw| kw.keyword.as_str()));
        reasons.push(reason(
            ReasonFactor::ContentKeywords,
            85.0,
            ImpactLevel::High,
            format!("The video carries searchable keywords: {}", keywords),
            &format!("Work these keywords into titles and descriptions: {}", keywords),
            "Maintain a keyword library and refresh it regularly",
        ));
    }

    if !trending.matched_trends.is_empty() {
        let topics = keyword_list(trending.matched_trends.iter().take(3).map(String::as_str));
        reasons.push(reason(
            ReasonFactor::TrendMatch,
            90.0,
            ImpactLevel::VeryHigh,
            format!("The content lines up with topics that were trending: {}", topics),
            &format!("Follow up on these topics with a series: {}", topics),
            "Track the lifecycle of trending topics and publish at the right moment",
        ));
    }

    if engagement.engagement_rate > 0.01 {
        reasons.push(reason(
            ReasonFactor::Engagement,
            (engagement.engagement_rate * 1000.0).min(100.0),
            ImpactLevel::High,
            format!(
                "Engagement reached {}, well above average",
                format_percent(engagement.engagement_rate * 100.0)
            ),
            "Study what drove comments and likes and repeat those moments",
            "Keep an engagement review template and favour high-engagement formats",
        ));
    }

    let predicted = record.predicted_views as f64;
    let actual = record.actual_views as f64;
    if predicted > 0.0 && actual > predicted * 1.2 {
        let overperformance = (actual / predicted - 1.0) * 100.0;
        reasons.push(reason(
            ReasonFactor::Overperformance,
            overperformance.min(100.0),
            ImpactLevel::High,
            format!("Views beat the prediction by {:.0}%, so other factors were at play", overperformance),
            "Break down the title, thumbnail, structure and timing to find what can be repeated",
            "Review videos that beat their forecast and keep a list of what worked",
        ));
    }

    if record.outlier_ratio > 2.0 {
        reasons.push(reason(
            ReasonFactor::PeerComparison,
            (record.outlier_ratio * 20.0).min(100.0),
            ImpactLevel::VeryHigh,
            format!(
                "Views were {}x the period average",
                format_float(record.outlier_ratio, 1)
            ),
            "Compare against the other videos from that month to find the edge",
            "Compare each month's videos and note what the standouts share",
        ));
    }

    let title_length = content.title_length;
    if (30..=60).contains(&title_length) {
        reasons.push(reason(
            ReasonFactor::TitleLength,
            85.0,
            ImpactLevel::Medium,
            format!("The title length ({} characters) fits the recommended range", title_length),
            "Keep titles between 30 and 60 characters so they display in full on mobile",
            "Keep a library of title templates per content type",
        ));
    }

    reasons
}

fn reason(
    factor: ReasonFactor,
    score: f64,
    impact: ImpactLevel,
    description: String,
    actionable_insight: &str,
    reusable_strategy: &str,
) -> OutlierReason {
    OutlierReason {
        factor,
        score,
        impact,
        description,
        actionable_insight: actionable_insight.to_string(),
        reusable_strategy: reusable_strategy.to_string(),
    }
}

pub fn analyze_content(title: &str, description: &str) -> ContentAnalysis {
    let top_keywords = content_keywords(title, description);
    let title_length = title.chars().count();
    let description_length = description.chars().count();

    let mut quality: f64 = 50.0;
    if (30..=60).contains(&title_length) {
        quality += 10.0;
    } else if title_length < 30 {
        quality += 5.0;
    }
    if description_length > 100 {
        quality += 10.0;
    } else if description_length > 50 {
        quality += 5.0;
    }
    if top_keywords.len() >= 5 {
        quality += 15.0;
    } else if top_keywords.len() >= 3 {
        quality += 10.0;
    }

    ContentAnalysis {
        content_themes: content_themes(title, description),
        top_keywords,
        quality_score: quality.min(100.0),
        title_length,
        description_length,
    }
}

pub fn content_themes(title: &str, description: &str) -> Vec<String> {
    let combined = format!("{} {}", title, description).to_lowercase();
    let words: HashSet<&str> = combined
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();

    THEMES
        .iter()
        .filter(|(_, triggers)| {
            triggers.iter().any(|trigger| {
                if trigger.contains(' ') {
                    combined.contains(trigger)
                } else {
                    words.contains(trigger)
                }
            })
        })
        .map(|(theme, _)| theme.to_string())
        .take(3)
        .collect()
}

/// Title words count double. Only the first 500 characters of the description are read.
fn content_keywords(title: &str, description: &str) -> Vec<ContentKeyword> {
    let stop_words: HashSet<&str> = CONTENT_STOP_WORDS.iter().copied().collect();
    let mut scores: HashMap<String, f64> = HashMap::new();
    let mut first_seen: Vec<String> = Vec::new();

    let description: String = description.chars().take(500).collect();
    for (text, weight) in [(title, 2.0), (description.as_str(), 1.0)] {
        for word in text
            .to_lowercase()
            .split(|ch: char| !ch.is_alphanumeric() && ch != '\'')
            .map(|word| word.trim_matches('\''))
        {
            if word.chars().count() <= 3 || stop_words.contains(word) {
                continue;
            }
            if !scores.contains_key(word) {
                first_seen.push(word.to_string());
            }
            *scores.entry(word.to_string()).or_insert(0.0) += weight;
        }
    }

    let mut keywords: Vec<ContentKeyword> = first_seen
        .into_iter()
        .map(|keyword| ContentKeyword {
            score: scores.get(&keyword).copied().unwrap_or(0.0),
            keyword,
        })
        .collect();
    keywords.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    keywords.truncate(10);
    keywords
}

fn trending_topics(record: &BacktestRecord, content: &ContentAnalysis) -> TrendingTopics {
    let mut seen = HashSet::new();
    let trending_keywords: Vec<String> = record
        .simulated_trend
        .keywords
        .iter()
        .map(String::as_str)
        .chain(content.top_keywords.iter().map(|kw| kw.keyword.as_str()))
        .filter(|keyword| seen.insert(keyword.to_string()))
        .take(10)
        .map(str::to_string)
        .collect();

    TrendingTopics {
        matched_trends: trending_keywords.iter().take(5).cloned().collect(),
        trending_keywords,
        viral_potential: record.simulated_trend.viral_potential,
    }
}

pub fn engagement_metrics(likes: u64, comments: u64, views: u64) -> EngagementMetrics {
    let engagement_rate = if views > 0 {
        (likes as f64 + comments as f64 * 2.0) / views as f64
    } else {
        0.0
    };
    EngagementMetrics {
        like_count: likes,
        comment_count: comments,
        engagement_rate,
        baseline_rate: ENGAGEMENT_BASELINE,
        engagement_multiplier: engagement_rate / ENGAGEMENT_BASELINE,
        engagement_level: EngagementLevel::from_rate(engagement_rate),
    }
}

fn analysis_summary(
    primary_factors: &[ReasonFactor],
    content: &ContentAnalysis,
    trending: &TrendingTopics,
    engagement: &EngagementMetrics,
    outlier_ratio: f64,
) -> String {
    let mut parts = Vec::new();
    if !primary_factors.is_empty() {
        let labels: Vec<&str> = primary_factors.iter().map(|factor| factor.label()).collect();
        parts.push(format!("Key success factors: {}", labels.join(", ")));
    }
    if content.quality_score >= 80.0 {
        parts.push("Strong content with rich keywords and a clear theme".to_string());
    }
    if !trending.matched_trends.is_empty() {
        parts.push("Caught the traffic of topics trending at the time".to_string());
    }
    if engagement.engagement_rate > 0.01 {
        parts.push(format!(
            "Engagement stood out at {}",
            format_percent(engagement.engagement_rate * 100.0)
        ));
    }
    if outlier_ratio > 2.0 {
        parts.push(format!(
            "A breakout at {}x the period average",
            format_float(outlier_ratio, 1)
        ));
    }

    if parts.is_empty() {
        "Performed well across several dimensions".to_string()
    } else {
        parts.join("; ")
    }
}

fn outlier_summary(record: &BacktestRecord, reasons: &[OutlierReason]) -> String {
    let mut summary = format!(
        "\"{}\" reached {} views, {}x the period average.",
        record.title,
        format_number(record.actual_views as f64),
        format_float(record.outlier_ratio, 1)
    );
    if let Some(top) = reasons.first() {
        summary.push_str(" Main driver: ");
        summary.push_str(&top.description);
    }
    summary
}

fn keyword_list<'a>(keywords: impl Iterator<Item = &'a str>) -> String {
    keywords.collect::<Vec<_>>().join(", ")
}
