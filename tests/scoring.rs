use trend_scout::scoring::calculator::{
    audience_fit, style_compatibility, topic_relevance, viral_potential, SubScores,
};
use trend_scout::scoring::matcher::{content_angle, determine_urgency, suggested_format};
use trend_scout::scoring::MatchScorer;
use trend_scout::{
    ChannelProfile, ChannelTopic, ContentStyle, ContentStyleKind, EngineError, HistoricalStats,
    PerformanceTier, TargetAudience, TrendSignal, Urgency,
};

fn scenario_channel() -> ChannelProfile {
    ChannelProfile {
        topics: vec![ChannelTopic {
            label: "ai tools".to_string(),
            score: 0.9,
        }],
        content_style: None,
        target_audience: None,
        historical_stats: HistoricalStats {
            median_views: Some(10_000.0),
            avg_views: Some(12_000.0),
            total_video_count: 60,
            avg_title_length: None,
        },
    }
}

#[test]
fn viral_potential_adds_growth_and_platform_bonuses() {
    let trend = TrendSignal::new("ai tools", 50.0, 40.0).with_sources(["twitter", "reddit"]);
    // 50 + min(30, 12) + min(20, 10)
    assert!((viral_potential(&trend) - 72.0).abs() < 1e-9);
}

#[test]
fn viral_potential_allows_negative_growth_before_clamping() {
    let trend = TrendSignal::new("fading", 50.0, -100.0).with_sources(["reddit"]);
    assert!((viral_potential(&trend) - 20.0).abs() < 1e-9);

    let collapsed = TrendSignal::new("gone", 5.0, -500.0).with_sources(["reddit"]);
    assert_eq!(viral_potential(&collapsed), 0.0);
}

#[test]
fn viral_potential_is_monotonic_in_composite_score() {
    let mut previous = f64::MIN;
    for composite in 0..=100 {
        let trend = TrendSignal::new("topic", composite as f64, 25.0).with_sources(["twitter"]);
        let viral = viral_potential(&trend);
        assert!(viral >= previous, "viral dropped at composite {}", composite);
        previous = viral;
    }
}

#[test]
fn neutral_defaults_for_missing_channel_data() {
    assert_eq!(topic_relevance("anything at all", &[]), 50.0);
    assert_eq!(topic_relevance("anything at all", &["   ".to_string()]), 50.0);

    let empty_style: ContentStyle = serde_json::from_str("{}").unwrap();
    let empty_audience: TargetAudience = serde_json::from_str("{}").unwrap();
    assert_eq!(style_compatibility("how to cook", Some(&empty_style)), 50.0);
    assert_eq!(audience_fit("viral meme", Some(&empty_audience)), 50.0);
    assert_eq!(style_compatibility("how to cook", None), 50.0);
    assert_eq!(audience_fit("viral meme", None), 50.0);
}

#[test]
fn topic_relevance_has_a_floor_of_twenty() {
    let topics = vec!["gaming".to_string()];
    assert_eq!(topic_relevance("sourdough baking", &topics), 20.0);
}

#[test]
fn topic_relevance_counts_exact_matches_and_word_overlap() {
    let topics = vec!["rust".to_string(), "async rust".to_string()];
    // exact: "rust" and "async rust" are substrings (2 * 20);
    // overlap: {rust} with "rust", {async, rust} with "async rust" (3 * 10)
    assert_eq!(topic_relevance("Async Rust tutorial", &topics), 70.0);
}

#[test]
fn style_compatibility_counts_style_keywords() {
    let style = ContentStyle::new(ContentStyleKind::Tutorial);
    assert_eq!(style_compatibility("how to learn rust guide", Some(&style)), 95.0);

    let review = ContentStyle::new(ContentStyleKind::Review);
    assert_eq!(style_compatibility("how to learn rust guide", Some(&review)), 50.0);
}

#[test]
fn audience_fit_uses_age_group_indicators() {
    let teens = TargetAudience::new("teens");
    assert_eq!(audience_fit("viral tiktok meme", Some(&teens)), 86.0);

    let unknown = TargetAudience::new("retirees");
    assert_eq!(audience_fit("popular family recipes", Some(&unknown)), 74.0);
}

#[test]
fn missing_age_group_scores_against_all_ages() {
    let audience: TargetAudience = serde_json::from_str(r#"{"engagementRate":0.05}"#).unwrap();
    assert_eq!(audience.primary_age_group, "");
    assert_eq!(audience_fit("trending family popular", Some(&audience)), 86.0);
    assert_eq!(audience_fit("quarterly tax filing", Some(&audience)), 50.0);
}

#[test]
fn unknown_style_label_maps_to_general() {
    let style: ContentStyle = serde_json::from_str(r#"{"primaryStyle": "Cooking"}"#).unwrap();
    assert_eq!(style.primary_style, ContentStyleKind::General);
    let style: ContentStyle = serde_json::from_str(r#"{"primaryStyle": "Tutorial"}"#).unwrap();
    assert_eq!(style.primary_style, ContentStyleKind::Tutorial);
}

#[test]
fn sub_scores_stay_in_bounds() {
    let channel = ChannelProfile {
        topics: vec![ChannelTopic {
            label: "game".to_string(),
            score: 1.0,
        }],
        content_style: Some(ContentStyle::new(ContentStyleKind::Gaming)),
        target_audience: Some(TargetAudience::new("kids")),
        historical_stats: HistoricalStats::default(),
    };
    let scorer = MatchScorer::default();
    let source_sets: [&[&str]; 4] = [
        &[],
        &["twitter"],
        &["twitter", "reddit", "google_trends"],
        &["twitter", "reddit", "google_trends", "youtube", "tiktok"],
    ];

    for composite in [0.0, 25.0, 50.0, 75.0, 100.0] {
        for growth in [-500.0, -50.0, 0.0, 80.0, 1_000.0] {
            for sources in source_sets {
                let trend = TrendSignal::new("kids game gaming play game", composite, growth)
                    .with_sources(sources.iter().copied());
                let scores = SubScores::compute(&trend, &channel);
                for value in [
                    scores.viral_potential,
                    scores.topic_relevance,
                    scores.style_compatibility,
                    scores.audience_fit,
                ] {
                    assert!((0.0..=100.0).contains(&value));
                }
                assert!(scores.topic_relevance >= 20.0);

                let result = scorer.score(&trend, &channel).unwrap();
                assert!((0.0..=100.0).contains(&result.match_score));
                assert!((0.0..=100.0).contains(&result.performance_score));
                assert!(result.predicted_performance.predicted_views >= 500);
            }
        }
    }
}

#[test]
fn scenario_exact_topic_match_is_reproducible() {
    let trend = TrendSignal::new("ai tools", 80.0, 50.0).with_sources(["twitter", "reddit"]);
    let result = MatchScorer::default()
        .score(&trend, &scenario_channel())
        .unwrap();

    assert_eq!(result.viral_potential, 100.0);
    // one exact match (20) plus two shared words (20)
    assert_eq!(result.sub_scores.topic_relevance, 40.0);
    assert!((result.relevance_score - 45.0).abs() < 1e-9);
    assert!((result.performance_score - 83.5).abs() < 1e-9);
    assert!((result.match_score - 76.625).abs() < 1e-9);

    let timeliness = 0.9 + 0.76625 * 0.25;
    let confidence = 0.9 + 0.76625 * 0.2;
    let combined: f64 = 2.5 * 0.775 * 1.2525 * timeliness * 1.0 * 1.05 * confidence;
    let expected_views = (10_600.0 * combined).round() as u64;
    assert_eq!(result.predicted_performance.predicted_views, expected_views);
    assert_eq!(result.predicted_performance.tier, PerformanceTier::Excellent);
    assert_eq!(result.predicted_performance.confidence, 86.0);
    assert_eq!(result.urgency, Urgency::Urgent);
}

#[test]
fn recommendation_rounds_scores_and_passes_enrichment_through() {
    let mut trend = TrendSignal::new("ai tools", 80.0, 50.0).with_sources(["reddit", "twitter"]);
    trend.hashtags = vec!["#ai".to_string()];
    trend.rising_queries = vec!["best ai tools".to_string()];

    let rec = MatchScorer::default()
        .recommend(&trend, &scenario_channel())
        .unwrap();
    assert_eq!(rec.match_score, 76.63);
    assert_eq!(rec.opportunity_score, rec.viral_potential);
    assert_eq!(rec.composite_social_score, 80.0);
    assert_eq!(rec.sources, vec!["reddit".to_string(), "twitter".to_string()]);
    assert_eq!(rec.related_info.hashtags, vec!["#ai".to_string()]);
    assert_eq!(rec.related_info.rising_queries, vec!["best ai tools".to_string()]);
}

#[test]
fn urgency_prefers_the_viral_threshold() {
    assert_eq!(determine_urgency(95.0, 10.0), Urgency::Urgent);
    assert_eq!(determine_urgency(10.0, 250.0), Urgency::Urgent);
    assert_eq!(determine_urgency(75.0, 0.0), Urgency::High);
    assert_eq!(determine_urgency(20.0, 120.0), Urgency::High);
    assert_eq!(determine_urgency(55.0, 0.0), Urgency::Medium);
    assert_eq!(determine_urgency(20.0, 60.0), Urgency::Medium);
    assert_eq!(determine_urgency(20.0, 10.0), Urgency::Low);

    let trend = TrendSignal::new("breaking story", 92.0, 10.0).with_sources(["twitter"]);
    let result = MatchScorer::default()
        .score(&trend, &ChannelProfile::default())
        .unwrap();
    assert!((result.viral_potential - 95.0).abs() < 1e-9);
    assert_eq!(result.urgency, Urgency::Urgent);
}

#[test]
fn reasoning_mentions_platforms_and_growth() {
    let trend = TrendSignal::new("ai tools", 70.0, 150.0)
        .with_sources(["twitter", "reddit", "google_trends"]);
    let result = MatchScorer::default()
        .score(&trend, &scenario_channel())
        .unwrap();
    assert!(result.reasoning.contains("3 platforms"));
    assert!(result.reasoning.contains("150%"));
    assert!(result.reasoning.starts_with("Extremely hot topic"));
}

#[test]
fn content_angle_adds_timing_hints() {
    let urgent = content_angle("rust 2.0", ContentStyleKind::Tutorial, 200.0);
    assert!(urgent.contains("48 hours"));
    let weekly = content_angle("rust 2.0", ContentStyleKind::Tutorial, 100.0);
    assert!(weekly.contains("this week"));
    let calm = content_angle("rust 2.0", ContentStyleKind::Tutorial, 10.0);
    assert!(!calm.contains("48 hours") && !calm.contains("this week"));
    assert!(calm.contains("rust 2.0"));

    assert_eq!(
        suggested_format(ContentStyleKind::Tutorial),
        "8-12 minute step-by-step tutorial"
    );
    assert_eq!(
        suggested_format(ContentStyleKind::General),
        "8-12 minute general feature"
    );
}

#[test]
fn invalid_trend_is_rejected() {
    let scorer = MatchScorer::default();
    let channel = ChannelProfile::default();

    for (raw, clamped) in [(150.0, 100.0), (-3.0, 0.0)] {
        let trend = TrendSignal::new("topic", raw, 0.0);
        let rec = scorer.score(&trend, &channel).unwrap().into_recommendation(&trend);
        assert_eq!(rec.composite_social_score, clamped);
    }

    let infinite = TrendSignal::new("topic", f64::INFINITY, 0.0);
    assert!(matches!(
        scorer.score(&infinite, &channel),
        Err(EngineError::InvalidInput(_))
    ));

    let blank = TrendSignal::new("   ", 50.0, 0.0);
    assert!(matches!(
        scorer.score(&blank, &channel),
        Err(EngineError::InvalidInput(_))
    ));

    let not_finite = TrendSignal::new("topic", 50.0, f64::NAN);
    assert!(scorer.score(&not_finite, &channel).is_err());
}

#[test]
fn negative_history_is_rejected() {
    let mut channel = ChannelProfile::default();
    channel.historical_stats.median_views = Some(-5.0);
    let trend = TrendSignal::new("topic", 50.0, 0.0);
    assert!(matches!(
        MatchScorer::default().score(&trend, &channel),
        Err(EngineError::InvalidInput(_))
    ));
}
