use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trace::TraceConfig;

/// Share of root moves the local search samples at random before sweeping the
/// remainder in board order.
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownOption {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AiStrategy {
    Minimax,
    LocalSearch,
    Random,
}

impl FromStr for AiStrategy {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minimax" | "alphabeta" | "alpha_beta" | "alpha-beta" => Ok(AiStrategy::Minimax),
            "local_search" | "local-search" | "localsearch" | "local" | "greedy" => {
                Ok(AiStrategy::LocalSearch)
            }
            "random" => Ok(AiStrategy::Random),
            _ => Err(UnknownOption {
                kind: "strategy",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl FromStr for AiDifficulty {
    type Err = UnknownOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "normal" | "medium" => Ok(AiDifficulty::Normal),
            "hard" => Ok(AiDifficulty::Hard),
            "expert" | "extreme" => Ok(AiDifficulty::Expert),
            _ => Err(UnknownOption {
                kind: "difficulty",
                value: s.to_string(),
            }),
        }
    }
}

/// Search settings. Missing JSON fields fall back to the `Normal` preset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub strategy: AiStrategy,
    /// Fixed search depth; `None` picks one from the root branching factor.
    pub max_depth: Option<u8>,
    /// Thinking budget; `None` searches without a deadline.
    pub time_limit_ms: Option<u64>,
    /// Shuffle children before expanding them.
    pub randomize: bool,
    /// Score with the structural heuristic instead of the raw box difference.
    pub use_heuristic: bool,
    pub pruning: bool,
    pub sample_fraction: f64,
    pub seed: Option<u64>,
    pub trace: TraceConfig,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        let base = Self {
            strategy: AiStrategy::Minimax,
            max_depth: None,
            time_limit_ms: None,
            randomize: false,
            use_heuristic: true,
            pruning: true,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            seed: None,
            trace: TraceConfig::silent(),
        };
        match difficulty {
            AiDifficulty::Easy => Self {
                strategy: AiStrategy::LocalSearch,
                time_limit_ms: Some(250),
                use_heuristic: false,
                ..base
            },
            AiDifficulty::Normal => Self {
                time_limit_ms: Some(1_000),
                randomize: true,
                ..base
            },
            AiDifficulty::Hard => Self {
                time_limit_ms: Some(2_000),
                ..base
            },
            AiDifficulty::Expert => Self {
                time_limit_ms: Some(4_000),
                ..base
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_limit_ms(mut self, limit_ms: Option<u64>) -> Self {
        self.time_limit_ms = limit_ms;
        self
    }

    pub fn with_trace(mut self, trace: TraceConfig) -> Self {
        self.trace = trace;
        self
    }

    /// Builds a config from optional difficulty/strategy names, ignoring
    /// unknown names the way the JS entry points expect.
    pub fn from_names(difficulty: Option<&str>, strategy: Option<&str>) -> Self {
        let difficulty = difficulty
            .and_then(|value| AiDifficulty::from_str(value).ok())
            .unwrap_or(AiDifficulty::Normal);
        let config = Self::from_difficulty(difficulty);
        match strategy.and_then(|value| AiStrategy::from_str(value).ok()) {
            Some(strategy) => config.with_strategy(strategy),
            None => config,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// `sample_fraction` clamped into `[0, 1]`; NaN counts as the default.
    pub fn effective_sample_fraction(&self) -> f64 {
        if self.sample_fraction.is_nan() {
            DEFAULT_SAMPLE_FRACTION
        } else {
            self.sample_fraction.clamp(0.0, 1.0)
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}
