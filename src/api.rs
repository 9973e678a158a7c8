use serde::{Deserialize, Serialize};
use trend_scout::{ChannelProfile, Recommendation, TrendSignal, VideoRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecommendationRequest {
    pub channel: ChannelProfile,
    #[serde(default)]
    pub trends: Vec<TrendSignal>,
    pub max_count: Option<usize>,
}

impl ApiRecommendationRequest {
    pub fn max_count(&self, default: usize) -> Result<usize, String> {
        match self.max_count {
            Some(0) => Err("maxCount must be at least 1".to_string()),
            Some(value) => Ok(value),
            None => Ok(default),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecommendationResponse {
    pub recommendations: Vec<Recommendation>,
    pub count: usize,
    pub trends_scored: usize,
    pub min_match_score: f64,
}

impl ApiRecommendationResponse {
    pub fn new(recommendations: Vec<Recommendation>, trends_scored: usize, min_match_score: f64) -> Self {
        Self {
            count: recommendations.len(),
            recommendations,
            trends_scored,
            min_match_score,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBacktestRequest {
    pub channel: ChannelProfile,
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    pub use_ml: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ApiHealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
