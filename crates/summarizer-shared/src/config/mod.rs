//! # Configuration (§6)
//!
//! Each component owns a typed config struct with a `Default` impl that
//! matches the spec's stated defaults. [`OrchestratorConfig`] aggregates
//! them and is the single object threaded through the composition root
//! (§4.10). Loading layers a TOML file (path from `SUMMARIZER_CONFIG_PATH`,
//! if set) under environment variables prefixed `SUMMARIZER__`, following
//! the config-file-plus-env-override shape the orchestration crate uses.

mod cancellation;
mod concurrency;
mod partial_result;
mod progress;
mod retry;
mod segmentation;

pub use cancellation::CancellationConfig;
pub use concurrency::ConcurrencyConfig;
pub use partial_result::PartialResultConfig;
pub use progress::{ProgressConfig, StageWeight};
pub use retry::RetryConfig;
pub use segmentation::SegmentationConfig;

use crate::errors::{SummarizerError, SummarizerResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub segmentation: SegmentationConfig,
    pub retry: RetryConfig,
    pub concurrency: ConcurrencyConfig,
    pub cancellation: CancellationConfig,
    pub partial_result: PartialResultConfig,
    pub progress: ProgressConfig,
}

impl OrchestratorConfig {
    /// Environment variable naming an optional TOML file to layer under
    /// `SUMMARIZER__`-prefixed environment overrides.
    pub const CONFIG_PATH_ENV: &'static str = "SUMMARIZER_CONFIG_PATH";

    /// Build the effective configuration: compiled-in defaults, overlaid by
    /// the file at `SUMMARIZER_CONFIG_PATH` (if set and present), overlaid
    /// by `SUMMARIZER__SECTION__FIELD`-style environment variables.
    pub fn load() -> SummarizerResult<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&defaults)
                .map_err(|e| SummarizerError::configuration(e.to_string()))?,
        );

        if let Ok(path) = std::env::var(Self::CONFIG_PATH_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("SUMMARIZER")
                .separator("__")
                .try_parsing(true),
        );

        let merged = builder
            .build()
            .map_err(|e| SummarizerError::configuration(e.to_string()))?;
        merged
            .try_deserialize()
            .map_err(|e| SummarizerError::configuration(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_internally_consistent() {
        let config = OrchestratorConfig::default();
        assert!(config.concurrency.default_concurrent_limit <= config.concurrency.max_concurrent_limit);
        let total: f64 = config.progress.stage_weights.iter().map(|w| w.weight).sum();
        assert!((total - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn load_without_env_or_file_returns_defaults() {
        std::env::remove_var(OrchestratorConfig::CONFIG_PATH_ENV);
        let loaded = OrchestratorConfig::load().expect("defaults must always load");
        assert_eq!(loaded, OrchestratorConfig::default());
    }
}
