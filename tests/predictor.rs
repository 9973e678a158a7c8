use trend_scout::scoring::predictor::{
    confidence_factor, tier_for, title_optimization, viral_multiplier,
};
use trend_scout::scoring::{
    resolve_baseline, MultiplierBreakdown, PerformancePredictor, PredictionContext,
    PredictionScores,
};
use trend_scout::{EngineError, HistoricalStats, PerformanceTier};

fn stats(median: Option<f64>, avg: Option<f64>) -> HistoricalStats {
    HistoricalStats {
        median_views: median,
        avg_views: avg,
        total_video_count: 60,
        avg_title_length: Some(45),
    }
}

fn uniform_scores(value: f64) -> PredictionScores {
    PredictionScores {
        match_score: value,
        viral_potential: value,
        performance_score: value,
        relevance_score: value,
    }
}

#[test]
fn baseline_prefers_blend_then_median_then_average() {
    let blended = resolve_baseline(&stats(Some(10_000.0), Some(20_000.0)), None);
    assert!((blended - 13_000.0).abs() < 1e-6);

    assert_eq!(resolve_baseline(&stats(Some(8_000.0), None), None), 8_000.0);
    assert_eq!(resolve_baseline(&stats(None, Some(9_000.0)), None), 9_000.0);
    assert_eq!(resolve_baseline(&stats(Some(0.0), Some(9_000.0)), None), 9_000.0);
}

#[test]
fn baseline_falls_back_to_period_average_then_default() {
    assert_eq!(resolve_baseline(&stats(None, None), Some(4_200.0)), 4_200.0);
    assert_eq!(resolve_baseline(&stats(Some(0.0), Some(0.0)), Some(4_200.0)), 4_200.0);
    assert_eq!(resolve_baseline(&stats(None, None), None), 10_000.0);
    assert_eq!(resolve_baseline(&stats(None, None), Some(0.0)), 10_000.0);
    // channel history wins over the period average
    assert_eq!(resolve_baseline(&stats(Some(8_000.0), None), Some(4_200.0)), 8_000.0);
}

#[test]
fn viral_multiplier_stays_within_clamp() {
    assert!((viral_multiplier(0.0) - 0.9).abs() < 1e-9);
    assert!((viral_multiplier(100.0) - 2.5).abs() < 1e-9);
    for viral in 0..=100 {
        let multiplier = viral_multiplier(viral as f64);
        assert!((0.7..=3.0).contains(&multiplier));
    }
}

#[test]
fn combined_multiplier_has_a_ceiling() {
    let context = PredictionContext {
        base_views: 10_000.0,
        total_video_count: 0,
        title_length: 45,
    };
    let breakdown = MultiplierBreakdown::compute(&uniform_scores(100.0), &context);
    assert!((breakdown.channel_stability - 1.1).abs() < 1e-9);
    assert!((breakdown.title_optimization - 1.05).abs() < 1e-9);
    let combined = breakdown.combined();
    assert!(combined > 6.5 && combined < 8.4);
}

#[test]
fn predicted_views_never_drop_below_floor() {
    let context = PredictionContext {
        base_views: 100.0,
        total_video_count: 500,
        title_length: 5,
    };
    let predictor = PerformancePredictor::new();
    assert_eq!(predictor.predict_views(&uniform_scores(0.0), &context), 500);

    let tiny = HistoricalStats {
        median_views: Some(1.0),
        avg_views: None,
        total_video_count: 3,
        avg_title_length: None,
    };
    let prediction = predictor.predict(&uniform_scores(0.0), &tiny).unwrap();
    assert_eq!(prediction.predicted_views, 500);
    assert_eq!(prediction.tier, PerformanceTier::Low);
}

#[test]
fn title_length_window_is_inclusive() {
    assert_eq!(title_optimization(29), 0.98);
    assert_eq!(title_optimization(30), 1.05);
    assert_eq!(title_optimization(60), 1.05);
    assert_eq!(title_optimization(61), 0.98);
}

#[test]
fn tiers_follow_composite_thresholds() {
    assert_eq!(tier_for(80.0), PerformanceTier::Excellent);
    assert_eq!(tier_for(79.9), PerformanceTier::Good);
    assert_eq!(tier_for(65.0), PerformanceTier::Good);
    assert_eq!(tier_for(50.0), PerformanceTier::Moderate);
    assert_eq!(tier_for(49.9), PerformanceTier::Low);
}

#[test]
fn confidence_and_views_grow_with_match_score() {
    let predictor = PerformancePredictor::default();
    let history = stats(Some(10_000.0), Some(12_000.0));
    let mut previous_confidence = f64::MIN;
    let mut previous_views = 0u64;

    for match_score in (0..=100).step_by(5) {
        let scores = PredictionScores {
            match_score: match_score as f64,
            viral_potential: 60.0,
            performance_score: 60.0,
            relevance_score: 60.0,
        };
        let prediction = predictor.predict(&scores, &history).unwrap();
        assert!(prediction.confidence >= previous_confidence);
        assert!(prediction.predicted_views >= previous_views);
        previous_confidence = prediction.confidence;
        previous_views = prediction.predicted_views;
    }

    assert!(confidence_factor(100.0) > confidence_factor(0.0));
}

#[test]
fn mid_range_scores_on_default_baseline() {
    let prediction = PerformancePredictor::new()
        .predict(&uniform_scores(60.0), &HistoricalStats::default())
        .unwrap();
    // 10k * 1.4 * 0.85 * 1.0 * 1.05 * 1.1 * 1.05 * 1.02
    let expected = (10_000.0_f64 * (1.4 * 0.85 * 1.0 * 1.05 * 1.1 * 1.05 * 1.02)).round() as u64;
    assert!((prediction.predicted_views as i64 - expected as i64).abs() <= 1);
    assert_eq!(prediction.tier, PerformanceTier::Moderate);
    assert_eq!(prediction.confidence, 60.0);
}

#[test]
fn out_of_range_scores_are_rejected() {
    let predictor = PerformancePredictor::new();
    let mut scores = uniform_scores(50.0);
    scores.viral_potential = 120.0;
    assert!(matches!(
        predictor.predict(&scores, &HistoricalStats::default()),
        Err(EngineError::InvalidInput(_))
    ));

    scores.viral_potential = f64::NAN;
    assert!(predictor
        .predict(&scores, &HistoricalStats::default())
        .is_err());
}
