use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backtest::harness::{BacktestHarness, BacktestReport, VideoRecord};
use crate::config::BacktestConfig;
use crate::ChannelProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestStatus {
    Success,
    Timeout,
    Error,
    InsufficientVideos,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestOutcome {
    pub status: BacktestStatus,
    pub video_count: usize,
    pub ml_enabled: bool,
    pub videos_tested: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BacktestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BacktestOutcome {
    fn without_report(status: BacktestStatus, video_count: usize, ml_enabled: bool, error: String) -> Self {
        Self {
            status,
            video_count,
            ml_enabled,
            videos_tested: 0,
            report: None,
            error: Some(error),
        }
    }
}

// On timeout the blocking task keeps running and its result is dropped.
pub async fn run_backtest_job(
    config: BacktestConfig,
    videos: Vec<VideoRecord>,
    channel: ChannelProfile,
    use_ml: bool,
) -> BacktestOutcome {
    let video_count = videos.len();
    if video_count < config.min_videos {
        return BacktestOutcome::without_report(
            BacktestStatus::InsufficientVideos,
            video_count,
            false,
            format!(
                "need at least {} videos, got {}",
                config.min_videos, video_count
            ),
        );
    }

    let ml_enabled = use_ml && video_count >= config.ml_min_videos;
    let timeout = config.timeout_for(video_count);
    info!(video_count, ml_enabled, timeout_secs = timeout.as_secs(), "starting backtest job");

    let harness = BacktestHarness::new(config);
    let task = tokio::task::spawn_blocking(move || harness.run(&videos, &channel, ml_enabled));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(Ok(report))) => BacktestOutcome {
            status: BacktestStatus::Success,
            video_count,
            ml_enabled: report.ml.is_some(),
            videos_tested: report.total_videos_tested,
            report: Some(report),
            error: None,
        },
        Ok(Ok(Err(err))) => {
            warn!(error = %err, "backtest rejected input");
            BacktestOutcome::without_report(BacktestStatus::Error, video_count, ml_enabled, err.to_string())
        }
        Ok(Err(err)) => {
            warn!(error = %err, "backtest task failed");
            BacktestOutcome::without_report(
                BacktestStatus::Error,
                video_count,
                ml_enabled,
                format!("backtest task failed: {}", err),
            )
        }
        Err(_) => {
            warn!(video_count, timeout_secs = timeout.as_secs(), "backtest timed out");
            BacktestOutcome::without_report(
                BacktestStatus::Timeout,
                video_count,
                ml_enabled,
                format!("backtest exceeded {}s", timeout.as_secs()),
            )
        }
    }
}
