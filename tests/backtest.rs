use trend_scout::backtest::metrics::{correlation, r_squared};
use trend_scout::backtest::outliers::{
    content_themes, engagement_metrics, explain_outlier, EngagementLevel,
};
use trend_scout::backtest::{
    extract_title_keywords, parse_published_at, period_stats, AccuracyMetrics, BacktestRecord,
    ReasonFactor, SynthesizedTrend,
};
use trend_scout::{backtest, BacktestConfig, BacktestHarness, ChannelProfile, VideoRecord};

fn video(id: &str, views: u64, published_at: &str) -> VideoRecord {
    VideoRecord::new(id, format!("Video {}", id), views, published_at)
}

/// Five videos per month through 2023, in publish order.
fn history(count: usize) -> Vec<VideoRecord> {
    (0..count)
        .map(|i| {
            let month = 1 + (i / 5) % 12;
            let day = 1 + (i % 5) * 5;
            let views = 1_000 + (i as u64 * 37 % 11) * 400;
            video(
                &format!("v{}", i),
                views,
                &format!("2023-{:02}-{:02}T12:00:00Z", month, day),
            )
        })
        .collect()
}

fn record(title: &str, actual: u64, predicted: u64, ratio: f64, trend: SynthesizedTrend) -> BacktestRecord {
    BacktestRecord {
        video_id: "vid".to_string(),
        title: title.to_string(),
        published_at: "2024-03-01T00:00:00Z".to_string(),
        actual_views: actual,
        predicted_views: predicted,
        period_avg_views: actual as f64 / ratio,
        error_abs: (actual as f64 - predicted as f64).abs(),
        error_percentage: 0.0,
        is_outlier: ratio > 1.2,
        outlier_ratio: ratio,
        simulated_trend: trend,
    }
}

#[test]
fn single_breakout_in_a_month_leads_the_outliers() {
    let videos = vec![
        video("a", 1_000, "2024-03-01T10:00:00Z"),
        video("b", 1_000, "2024-03-02T10:00:00Z"),
        video("c", 1_000, "2024-03-03T10:00:00Z"),
        video("d", 1_000, "2024-03-04T10:00:00Z"),
        video("e", 5_000, "2024-03-05T10:00:00Z"),
    ];
    let report = backtest(&videos, &ChannelProfile::default(), false).unwrap();

    assert_eq!(report.total_videos_tested, 5);
    let flagged: Vec<&str> = report
        .per_video_results
        .iter()
        .filter(|result| result.is_outlier)
        .map(|result| result.video_id.as_str())
        .collect();
    assert_eq!(flagged, vec!["e"]);

    let breakout = &report.per_video_results[4];
    assert!((breakout.period_avg_views - 1_800.0).abs() < 1e-9);
    assert!((breakout.outlier_ratio - 5_000.0 / 1_800.0).abs() < 1e-9);

    // fewer flagged outliers than requested, so every video is listed
    assert_eq!(report.top_outliers.len(), 5);
    assert_eq!(report.top_outliers[0].record.video_id, "e");
    assert_eq!(report.predictor, "rule_based");
    assert!(report.ml.is_none());
}

#[test]
fn lone_video_in_a_month_has_ratio_one() {
    let videos = vec![
        video("a", 2_000, "2024-01-10T10:00:00Z"),
        video("b", 3_000, "2024-02-10T10:00:00Z"),
        video("c", 0, "2024-03-10T10:00:00Z"),
    ];
    let report = backtest(&videos, &ChannelProfile::default(), false).unwrap();

    for result in &report.per_video_results {
        assert!((result.outlier_ratio - 1.0).abs() < 1e-9);
        assert!(!result.is_outlier);
    }
    assert_eq!(report.per_video_results[0].period_avg_views, 2_000.0);
    assert_eq!(report.per_video_results[2].period_avg_views, 0.0);
}

#[test]
fn zero_view_videos_are_excluded_from_metrics() {
    let mut videos = history(12);
    videos[3].view_count = 0;
    let report = backtest(&videos, &ChannelProfile::default(), false).unwrap();

    assert_eq!(report.total_videos_tested, 12);
    assert_eq!(report.excluded_from_metrics, 1);
    assert_eq!(report.accuracy_metrics.sample_count, 11);
    let zero = report
        .per_video_results
        .iter()
        .find(|result| result.video_id == "v3")
        .unwrap();
    assert_eq!(zero.error_percentage, 0.0);
    assert!(report
        .top_outliers
        .iter()
        .all(|outlier| outlier.record.actual_views > 0));
}

#[test]
fn unparseable_dates_are_reported_not_tested() {
    let mut videos = history(10);
    videos.push(video("broken", 4_000, "last tuesday"));
    videos.push(video("empty", 4_000, ""));

    let report = backtest(&videos, &ChannelProfile::default(), false).unwrap();
    assert_eq!(report.total_videos_tested, 10);
    let excluded: Vec<&str> = report
        .excluded
        .iter()
        .map(|item| item.video_id.as_str())
        .collect();
    assert_eq!(excluded, vec!["broken", "empty"]);
    assert!(report
        .per_video_results
        .iter()
        .all(|result| result.video_id != "broken"));
}

#[test]
fn only_the_most_recent_videos_are_tested() {
    let mut videos = history(60);
    videos.reverse();
    let report = backtest(&videos, &ChannelProfile::default(), false).unwrap();

    assert_eq!(report.total_videos_tested, 50);
    assert_eq!(report.per_video_results[0].video_id, "v10");
    assert_eq!(report.per_video_results[49].video_id, "v59");

    let harness = BacktestHarness::new(BacktestConfig {
        max_videos: 20,
        ..BacktestConfig::default()
    });
    let report = harness
        .run(&history(60), &ChannelProfile::default(), false)
        .unwrap();
    assert_eq!(report.total_videos_tested, 20);
    assert_eq!(report.per_video_results[0].video_id, "v40");
}

#[test]
fn predictions_respect_the_floor() {
    let report = backtest(&history(30), &ChannelProfile::default(), false).unwrap();
    for result in &report.per_video_results {
        assert!(result.predicted_views >= 500);
        assert!(result.error_abs >= 0.0);
    }
    assert!(report.accuracy_metrics.mae >= 0.0);
    assert!(report.accuracy_metrics.mape.is_finite());
}

#[test]
fn synthesized_trend_follows_ratio_bands() {
    let average = SynthesizedTrend::from_ratio(Vec::new(), 1.0);
    assert!((average.viral_potential - 55.0).abs() < 1e-9);
    assert!((average.relevance_score - 54.0).abs() < 1e-9);
    assert!((average.performance_score - 55.0).abs() < 1e-9);

    let breakout = SynthesizedTrend::from_ratio(Vec::new(), 5.0);
    assert!((breakout.viral_potential - 70.0).abs() < 1e-9);
    assert!((breakout.relevance_score - 63.0).abs() < 1e-9);
    assert!((breakout.performance_score - 70.0).abs() < 1e-9);

    let flop = SynthesizedTrend::from_ratio(Vec::new(), 0.2);
    assert_eq!(flop.viral_potential, 30.0);
    assert_eq!(flop.relevance_score, 30.0);
    assert!((flop.match_score - 30.0).abs() < 1e-9);

    let extreme = SynthesizedTrend::from_ratio(Vec::new(), 100.0);
    assert_eq!(extreme.viral_potential, 98.0);
    assert_eq!(extreme.relevance_score, 95.0);
    assert_eq!(extreme.performance_score, 95.0);
}

#[test]
fn title_keywords_skip_short_and_stop_words() {
    assert_eq!(
        extract_title_keywords("The Ultimate Guide to Rust and Tokio in 2024"),
        vec!["ultimate", "guide", "rust", "tokio", "2024"]
    );
    assert!(extract_title_keywords("a day in the sun").is_empty());
}

#[test]
fn publish_dates_accept_common_formats() {
    let utc = parse_published_at("2024-03-05T10:00:00Z").unwrap();
    assert_eq!(utc.to_rfc3339(), "2024-03-05T10:00:00+00:00");

    let offset = parse_published_at("2024-03-05T10:00:00+02:00").unwrap();
    assert_eq!(offset.to_rfc3339(), "2024-03-05T08:00:00+00:00");

    assert!(parse_published_at("2024-03-05T10:00:00").is_some());
    assert!(parse_published_at("2024-03-05T10:00:00.250").is_some());
    assert!(parse_published_at("2024-03-05").is_some());
    assert!(parse_published_at("").is_none());
    assert!(parse_published_at("March 5th").is_none());
}

#[test]
fn period_stats_group_by_month_and_skip_zero_views() {
    let entries = [
        ("2024-01-03", 1_000),
        ("2024-01-20", 3_000),
        ("2024-01-25", 0),
        ("2024-02-01", 500),
        ("2024-03-01", 0),
    ];
    let stats = period_stats(
        entries
            .iter()
            .map(|(date, views)| (parse_published_at(date).unwrap(), *views)),
    );

    assert_eq!(stats.len(), 2);
    let january = stats.get("2024-01").unwrap();
    assert_eq!(january.count, 2);
    assert_eq!(january.avg_views, 2_000.0);
    assert_eq!(january.median_views, 2_000.0);
    assert_eq!(stats.get("2024-02").unwrap().avg_views, 500.0);
    assert!(stats.get("2024-03").is_none());
}

#[test]
fn metrics_on_perfect_predictions() {
    let metrics = AccuracyMetrics::compute(&[(100.0, 100.0), (200.0, 200.0), (300.0, 300.0)]);
    assert_eq!(metrics.mae, 0.0);
    assert_eq!(metrics.mape, 0.0);
    assert_eq!(metrics.rmse, 0.0);
    assert!((metrics.r2 - 1.0).abs() < 1e-9);
    assert!((metrics.correlation - 1.0).abs() < 1e-9);
    assert_eq!(metrics.sample_count, 3);
}

#[test]
fn metrics_degenerate_cases_stay_finite() {
    let single = AccuracyMetrics::compute(&[(150.0, 100.0)]);
    assert_eq!(single.r2, 0.0);
    assert_eq!(single.correlation, 0.0);
    assert!((single.mae - 50.0).abs() < 1e-9);
    assert!((single.mape - 50.0).abs() < 1e-9);

    let flat = AccuracyMetrics::compute(&[(90.0, 100.0), (110.0, 100.0)]);
    assert_eq!(flat.r2, 0.0);
    assert_eq!(flat.correlation, 0.0);
    assert!((flat.mae - 10.0).abs() < 1e-9);
    assert!((flat.mape - 10.0).abs() < 1e-9);
    assert!((flat.rmse - 10.0).abs() < 1e-9);

    let zero_actual = AccuracyMetrics::compute(&[(500.0, 0.0), (120.0, 100.0)]);
    assert_eq!(zero_actual.sample_count, 1);
    assert!((zero_actual.mape - 20.0).abs() < 1e-9);

    assert_eq!(AccuracyMetrics::compute(&[]), AccuracyMetrics::default());
    assert_eq!(r_squared(&[(1.0, 1.0)]), 0.0);
    assert_eq!(correlation(&[(1.0, 5.0), (2.0, 5.0)]), 0.0);
}

#[test]
fn breakout_explanation_covers_every_triggered_factor() {
    let title = "How I Built a Rust Web Server in One Weekend";
    let trend = SynthesizedTrend::from_ratio(extract_title_keywords(title), 12.0);
    let record = record(title, 10_000, 2_000, 12.0, trend);
    let mut source = VideoRecord::new("vid", title, 10_000, "2024-03-01T00:00:00Z");
    source.like_count = 300;
    source.comment_count = 10;

    let explanation = explain_outlier(&record, Some(&source));
    for factor in [
        ReasonFactor::ViralPotential,
        ReasonFactor::Relevance,
        ReasonFactor::ContentKeywords,
        ReasonFactor::TrendMatch,
        ReasonFactor::Engagement,
        ReasonFactor::Overperformance,
        ReasonFactor::PeerComparison,
        ReasonFactor::TitleLength,
    ] {
        assert!(explanation.has_reason(factor), "missing {:?}", factor);
    }

    assert!(explanation.primary_factors.contains(&ReasonFactor::ViralPotential));
    assert_eq!(explanation.secondary_factors, vec![ReasonFactor::TitleLength]);
    assert_eq!(explanation.action_plan.len(), explanation.reasons.len());
    assert_eq!(explanation.success_probability, 100.0);
    assert_eq!(explanation.engagement.engagement_level, EngagementLevel::VeryHigh);
    assert!(explanation.summary.contains(title));
}

#[test]
fn ordinary_video_gets_a_generic_explanation() {
    let record = record("Hi", 10_000, 9_000, 1.0, SynthesizedTrend::from_ratio(Vec::new(), 1.0));
    let explanation = explain_outlier(&record, None);

    assert!(explanation.reasons.is_empty());
    assert!(explanation.primary_factors.is_empty());
    assert_eq!(
        explanation.analysis_summary,
        "Performed well across several dimensions"
    );
    assert!((explanation.success_probability - 50.0).abs() < 1e-9);
}

#[test]
fn engagement_weights_comments_double() {
    let metrics = engagement_metrics(50, 25, 10_000);
    assert!((metrics.engagement_rate - 0.01).abs() < 1e-12);
    assert!((metrics.engagement_multiplier - 2.0).abs() < 1e-9);

    let none = engagement_metrics(10, 10, 0);
    assert_eq!(none.engagement_rate, 0.0);
    assert_eq!(none.engagement_level, EngagementLevel::Low);
}

#[test]
fn themes_match_phrases_and_whole_words() {
    assert_eq!(
        content_themes("How to build a gaming PC", ""),
        vec!["tutorial".to_string(), "gaming".to_string()]
    );
    // "testing" must not trigger the review theme
    assert!(content_themes("Testing my patience", "").is_empty());
}

#[test]
fn report_serializes_with_camel_case_fields() {
    let report = backtest(&history(12), &ChannelProfile::default(), false).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json.get("perVideoResults").is_some());
    assert!(json.get("accuracyMetrics").is_some());
    let first_outlier = &json["topOutliers"][0];
    assert!(first_outlier.get("outlierRatio").is_some());
    assert!(first_outlier.get("explanation").is_some());
}
