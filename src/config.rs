//! Engine tuning parameters.
//!
//! Every weight, penalty, and window size the engine uses lives here as a
//! field on [`EngineConfig`], so hosts can ship tuned values (for example
//! from a remote-config blob) without recompiling. `Default` carries the
//! shipped tuning.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Immutable tuning parameters for scoring, selection, and diversity.
///
/// Weights sum to well under 1 on top of the 0.5 base so composite scores
/// stay boundable before the final clamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Weight of the blended like/completion preference signal.
    pub preference_weight: f64,
    /// Weight of the seed-song transition likelihood.
    pub transition_weight: f64,
    /// Weight of the staleness bonus for songs not heard in a while.
    pub recency_weight: f64,
    /// Multiplier applied to a song's skip rate as a penalty.
    pub skip_penalty_factor: f64,
    /// Flat penalty for songs on the caller's recently-played list.
    pub recent_play_penalty: f64,
    /// Flat penalty for an artist already in the rolling window.
    pub same_artist_penalty: f64,
    /// Half-life, in days, of the staleness curve.
    pub recency_half_life_days: f64,
    /// Size of the rolling recent-artist window.
    pub max_recent_artists: usize,
    /// Probability of bypassing scoring for a uniform exploratory pick.
    pub exploration_rate: f64,
    /// How many preference records to pull per build.
    pub preference_fetch_limit: usize,
    /// How many continuations to pull from the transition model per build.
    pub transition_fetch_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preference_weight: 0.20,
            transition_weight: 0.35,
            recency_weight: 0.10,
            skip_penalty_factor: 0.5,
            recent_play_penalty: 0.3,
            same_artist_penalty: 0.4,
            recency_half_life_days: 7.0,
            max_recent_artists: 3,
            exploration_rate: 0.15,
            preference_fetch_limit: 500,
            transition_fetch_limit: 50,
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON blob, filling missing fields from the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not valid JSON for this shape.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse engine config JSON")
    }

    /// Exploration rate clamped to a valid probability. Out-of-range
    /// tuning values from a host blob should degrade, not misbehave.
    #[must_use]
    pub fn exploration_probability(&self) -> f64 {
        self.exploration_rate.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_tuning() {
        let cfg = EngineConfig::default();
        assert!((cfg.preference_weight - 0.20).abs() < 1e-12);
        assert!((cfg.transition_weight - 0.35).abs() < 1e-12);
        assert!((cfg.recency_weight - 0.10).abs() < 1e-12);
        assert!((cfg.same_artist_penalty - 0.4).abs() < 1e-12);
        assert_eq!(cfg.max_recent_artists, 3);
        assert!((cfg.exploration_rate - 0.15).abs() < 1e-12);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{"exploration_rate": 0.4}"#).unwrap();
        assert!((cfg.exploration_rate - 0.4).abs() < 1e-12);
        assert!((cfg.transition_weight - 0.35).abs() < 1e-12);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(EngineConfig::from_json_str("not json").is_err());
    }

    #[test]
    fn exploration_probability_is_clamped() {
        let cfg = EngineConfig {
            exploration_rate: 3.0,
            ..Default::default()
        };
        assert_eq!(cfg.exploration_probability(), 1.0);
        let cfg = EngineConfig {
            exploration_rate: -0.5,
            ..Default::default()
        };
        assert_eq!(cfg.exploration_probability(), 0.0);
    }

    #[test]
    fn json_round_trip_preserves_tuning() {
        let cfg = EngineConfig {
            recency_half_life_days: 14.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
