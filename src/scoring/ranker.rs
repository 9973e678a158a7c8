use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::config::RankerConfig;
use crate::scoring::MatchScorer;
use crate::{normalize_keyword, ChannelProfile, EngineError, Recommendation, TrendSignal};

#[derive(Debug, Clone, Default)]
pub struct RecommendationRanker {
    config: RankerConfig,
    scorer: MatchScorer,
}

impl RecommendationRanker {
    pub fn new(config: RankerConfig) -> Self {
        Self {
            config,
            scorer: MatchScorer::default(),
        }
    }

    pub fn with_scorer(config: RankerConfig, scorer: MatchScorer) -> Self {
        Self { config, scorer }
    }

    pub fn config(&self) -> &RankerConfig {
        &self.config
    }

    pub fn rank_default(
        &self,
        trends: &[TrendSignal],
        channel: &ChannelProfile,
    ) -> Result<Vec<Recommendation>, EngineError> {
        self.rank(trends, channel, self.config.max_recommendations)
    }

    pub fn rank(
        &self,
        trends: &[TrendSignal],
        channel: &ChannelProfile,
        max_count: usize,
    ) -> Result<Vec<Recommendation>, EngineError> {
        channel.validate()?;

        let mut ranked: Vec<Recommendation> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut below_threshold = 0usize;

        for trend in trends {
            let recommendation = self.scorer.recommend(trend, channel)?;
            if recommendation.match_score < self.config.min_match_score {
                below_threshold += 1;
                continue;
            }

            // A duplicate keeps the slot of the first occurrence.
            let key = normalize_keyword(&recommendation.keyword);
            match positions.get(&key) {
                Some(&index) => {
                    if recommendation.match_score > ranked[index].match_score {
                        ranked[index] = recommendation;
                    }
                }
                None => {
                    positions.insert(key, ranked.len());
                    ranked.push(recommendation);
                }
            }
        }

        ranked.sort_by(|a, b| {
            b.match_score
                .partial_cmp(&a.match_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(max_count);

        debug!(
            trends = trends.len(),
            below_threshold,
            returned = ranked.len(),
            "ranked trend recommendations"
        );
        Ok(ranked)
    }
}
