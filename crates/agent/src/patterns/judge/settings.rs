//! Tunables of the judged chain-of-thought loop.

use promptlab_config::ChainConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    /// Hard cap on recorded steps before OUTPUT is forced
    pub max_steps: usize,
    pub main_temperature: f32,
    pub evaluation_temperature: f32,
    /// Pause between loop iterations
    pub thinking_delay: Duration,
    pub evaluator_context: usize,
    pub improver_context: usize,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self::from(&ChainConfig::default())
    }
}

impl From<&ChainConfig> for ChainSettings {
    fn from(config: &ChainConfig) -> Self {
        Self {
            max_steps: config.max_steps,
            main_temperature: config.main_temperature,
            evaluation_temperature: config.evaluation_temperature,
            thinking_delay: Duration::from_millis(config.thinking_delay_ms),
            evaluator_context: config.evaluator_context,
            improver_context: config.improver_context,
        }
    }
}
