use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankerConfig {
    pub min_match_score: f64,
    pub max_recommendations: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            min_match_score: 30.0,
            max_recommendations: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BacktestConfig {
    pub max_videos: usize,
    pub outlier_threshold: f64,
    pub top_outliers: usize,
    pub min_videos: usize,
    pub ml_min_videos: usize,
    pub timeout_secs: u64,
    pub large_timeout_secs: u64,
    pub large_batch_videos: usize,
    pub ml_seed: u64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            max_videos: 50,
            outlier_threshold: 1.2,
            top_outliers: 5,
            min_videos: 10,
            ml_min_videos: 20,
            timeout_secs: 30,
            large_timeout_secs: 60,
            large_batch_videos: 50,
            ml_seed: 42,
        }
    }
}

impl BacktestConfig {
    pub fn timeout_for(&self, video_count: usize) -> Duration {
        if video_count > self.large_batch_videos {
            Duration::from_secs(self.large_timeout_secs)
        } else {
            Duration::from_secs(self.timeout_secs)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranker: RankerConfig,
    pub backtest: BacktestConfig,
    pub server: ServerConfig,
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), String> {
        let config_path = path.or_else(default_config_path);
        let mut config = if let Some(path) = config_path.as_ref() {
            if path.exists() {
                let contents = std::fs::read_to_string(path)
                    .map_err(|err| format!("failed to read config: {}", err))?;
                toml::from_str(&contents)
                    .map_err(|err| format!("failed to parse config: {}", err))?
            } else {
                EngineConfig::default()
            }
        } else {
            EngineConfig::default()
        };

        config.apply_env_overrides();
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload)
            .map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("MIN_MATCH_SCORE") {
            if let Ok(value) = value.parse::<f64>() {
                self.ranker.min_match_score = value;
            }
        }
        if let Ok(value) = env::var("MAX_RECOMMENDATIONS") {
            if let Ok(value) = value.parse::<usize>() {
                self.ranker.max_recommendations = value;
            }
        }
        if let Ok(value) = env::var("BACKTEST_MAX_VIDEOS") {
            if let Ok(value) = value.parse::<usize>() {
                self.backtest.max_videos = value;
            }
        }
        if let Ok(value) = env::var("BACKTEST_TIMEOUT_SECS") {
            if let Ok(value) = value.parse::<u64>() {
                self.backtest.timeout_secs = value;
            }
        }
        if let Ok(value) = env::var("ML_SEED") {
            if let Ok(value) = value.parse::<u64>() {
                self.backtest.ml_seed = value;
            }
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("TREND_SCOUT_CONFIG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/trend-scout.toml")))
}
