//! Environment-driven configuration.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingAlgorithm {
    V4_4,
    V5IdealProfile,
    V6Funnel,
}

impl MatchingAlgorithm {
    pub fn from_env() -> Self {
        match env::var("MATCHING_ALGORITHM").as_deref() {
            Ok("v4.4") => MatchingAlgorithm::V4_4,
            Ok("v5.0-ideal-profile") => MatchingAlgorithm::V5IdealProfile,
            _ => MatchingAlgorithm::V6Funnel,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FunnelOptions {
    pub include_expired: bool,
    pub minimum_score: u32,
}

impl Default for FunnelOptions {
    fn default() -> Self {
        FunnelOptions { include_expired: false, minimum_score: 55 }
    }
}

/// Per-1K-token KRW rates for LLM cost accounting (§9 "Rates are
/// configuration, not code").
#[derive(Debug, Clone, Copy)]
pub struct LlmRates {
    pub input_per_1k_krw: f64,
    pub output_per_1k_krw: f64,
}

impl Default for LlmRates {
    fn default() -> Self {
        // Conservative default rates; override via env in production.
        LlmRates { input_per_1k_krw: 1.5, output_per_1k_krw: 6.0 }
    }
}

impl LlmRates {
    pub fn from_env() -> Self {
        let input = env::var("LLM_INPUT_RATE_KRW_PER_1K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| Self::default().input_per_1k_krw);
        let output = env::var("LLM_OUTPUT_RATE_KRW_PER_1K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| Self::default().output_per_1k_krw);
        LlmRates { input_per_1k_krw: input, output_per_1k_krw: output }
    }

    pub fn cost_krw(&self, input_tokens: u32, output_tokens: u32) -> u64 {
        let cost = (input_tokens as f64 / 1000.0) * self.input_per_1k_krw
            + (output_tokens as f64 / 1000.0) * self.output_per_1k_krw;
        cost.round() as u64
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub pacing: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig { batch_size: 20, pacing: Duration::from_secs(1) }
    }
}

pub fn shadow_mode_enabled() -> bool {
    matches!(env::var("MATCHING_SHADOW_MODE").as_deref(), Ok("true"))
}
