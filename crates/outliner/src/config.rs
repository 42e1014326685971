use std::path::Path;

use outliner_core::classify::{HeuristicConfig, TitleConfig};
use outliner_core::filter::FilterConfig;
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Settings loaded from the optional TOML file.
///
/// Every section and key is optional; missing values keep their defaults
/// and unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub filter: FilterConfig,
    pub title: TitleConfig,
    pub heuristic: HeuristicConfig,
    pub batch: BatchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Documents processed at once. Defaults to the available parallelism.
    pub jobs: Option<usize>,
}

impl BatchConfig {
    pub fn jobs(&self) -> usize {
        self.jobs
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1)
    }
}

impl Config {
    /// Load the file at `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| f!("Failed to read config file {}", path.display()))?;

        Self::from_toml(&raw).map_err(|e| Error::Config(f!("{}: {}", path.display(), e)).into())
    }

    pub fn from_toml(raw: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply CLI overrides on top of file values.
    pub fn with_overrides(
        mut self,
        z: Option<f64>,
        keep_repeated: bool,
        jobs: Option<usize>,
    ) -> Self {
        if let Some(z) = z {
            self.filter.z = z;
        }
        if keep_repeated {
            self.filter.remove_repetitive_headers = false;
        }
        if let Some(jobs) = jobs {
            self.batch.jobs = Some(jobs);
        }
        self
    }
}
