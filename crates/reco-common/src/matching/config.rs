use tracing::warn;

use super::weights::{OFFRE_WEIGHTS, Weights};

/// 求人レコメンドの既定件数（上位 5 件）
pub const DEFAULT_OFFRE_LIMIT: usize = 5;

/// レコメンドの調整値。不変なのでリクエスト間で共有してよい
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationConfig {
    pub offre_weights: Weights,
    pub offre_limit: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            offre_weights: OFFRE_WEIGHTS,
            offre_limit: DEFAULT_OFFRE_LIMIT,
        }
    }
}

impl RecommendationConfig {
    /// 環境変数から読み込み
    ///
    /// - RECO_OFFRE_LIMIT (既定 5)
    /// - RECO_OFFRE_SKILL_WEIGHT / RECO_OFFRE_LOCATION_WEIGHT (既定 0.7 / 0.3)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let offre_limit = match lookup("RECO_OFFRE_LIMIT").map(|raw| raw.trim().parse::<usize>()) {
            None => defaults.offre_limit,
            Some(Ok(limit)) if limit > 0 => limit,
            Some(_) => {
                warn!(
                    default = defaults.offre_limit,
                    "RECO_OFFRE_LIMIT must be a positive integer; using default"
                );
                defaults.offre_limit
            }
        };

        let parse_weight = |name: &str, fallback: f64| -> Option<f64> {
            match lookup(name) {
                None => Some(fallback),
                Some(raw) => raw.trim().parse::<f64>().ok().filter(|w| w.is_finite()),
            }
        };

        let skill = parse_weight("RECO_OFFRE_SKILL_WEIGHT", defaults.offre_weights.skill);
        let location = parse_weight("RECO_OFFRE_LOCATION_WEIGHT", defaults.offre_weights.location);

        let offre_weights = match (skill, location) {
            (Some(skill), Some(location)) => {
                let weights = Weights {
                    text: 0.0,
                    skill,
                    location,
                };
                if weights.is_bounded() {
                    weights
                } else {
                    warn!(
                        skill,
                        location, "offre weights must be non-negative and sum to 1.0; using defaults"
                    );
                    defaults.offre_weights
                }
            }
            _ => {
                warn!("offre weights are not valid numbers; using defaults");
                defaults.offre_weights
            }
        };

        Self {
            offre_weights,
            offre_limit,
        }
    }
}
