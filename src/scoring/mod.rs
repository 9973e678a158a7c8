pub mod calculator;
pub mod matcher;
pub mod predictor;
pub mod ranker;

pub use calculator::{audience_fit, style_compatibility, topic_relevance, viral_potential, SubScores};
pub use matcher::{determine_urgency, performance_potential, MatchResult, MatchScorer};
pub use predictor::{
    resolve_baseline, MultiplierBreakdown, PerformancePredictor, PredictionContext,
    PredictionScores,
};
pub use ranker::RecommendationRanker;
