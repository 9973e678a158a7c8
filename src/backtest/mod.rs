pub mod harness;
pub mod metrics;
pub mod ml;
pub mod outliers;
pub mod runner;

pub use harness::{
    extract_title_keywords, parse_published_at, period_stats, BacktestHarness, BacktestRecord,
    BacktestReport, ExcludedVideo, PeriodStats, SynthesizedTrend, VideoRecord,
};
pub use metrics::AccuracyMetrics;
pub use outliers::{OutlierAnalysis, OutlierExplanation, ReasonFactor};
pub use runner::{run_backtest_job, BacktestOutcome, BacktestStatus};
