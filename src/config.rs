// Configuration for Canary
// Settings come from an optional TOML file, then command-line overrides

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::DEFAULT_CONCURRENCY;
use crate::error::{CanaryError, CanaryResult};
use crate::models::{
    CanaryConfig, CanaryMode, InjectorConfig, LogFormat, MutationPolicy, OutputOrder, TargetParams,
};

/// All user-facing settings.
///
/// Every field has a default so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `timestamp`, a `start-end` range, or a literal token
    pub canary: String,
    pub oast: Option<String>,
    pub prefix: String,
    pub suffix: String,
    pub delimiter: String,
    pub keep_original: bool,
    pub replace_all: bool,
    pub targets: Vec<String>,
    pub raw: bool,
    pub concurrency: usize,
    /// Write results in input order instead of completion order
    pub ordered: bool,
    pub output: PathBuf,
    pub log: Option<PathBuf>,
    pub log_format: LogFormat,
    pub verbose: bool,
    pub quiet: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canary: "timestamp".to_string(),
            oast: None,
            prefix: String::new(),
            suffix: String::new(),
            delimiter: String::new(),
            keep_original: false,
            replace_all: false,
            targets: Vec::new(),
            raw: false,
            concurrency: DEFAULT_CONCURRENCY,
            ordered: false,
            output: PathBuf::from("requests.dreq"),
            log: None,
            log_format: LogFormat::Text,
            verbose: false,
            quiet: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> CanaryResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn validate(&self) -> CanaryResult<()> {
        if self.concurrency == 0 {
            return Err(CanaryError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.canary.is_empty() {
            return Err(CanaryError::Config("canary value cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn output_order(&self) -> OutputOrder {
        if self.ordered {
            OutputOrder::Input
        } else {
            OutputOrder::Completion
        }
    }

    /// Build the immutable configuration shared by all workers
    pub fn injector_config(&self) -> InjectorConfig {
        let canary = CanaryConfig {
            mode: CanaryMode::from_value(&self.canary),
            prefix: self.prefix.clone(),
            suffix: self.suffix.clone(),
            delimiter: self.delimiter.clone(),
            oast_domain: self.oast.clone().filter(|domain| !domain.is_empty()),
        };

        InjectorConfig {
            canary,
            targets: self.targets.iter().collect::<TargetParams>(),
            policy: MutationPolicy {
                keep_original: self.keep_original,
                replace_all: self.replace_all,
            },
            raw_mode: self.raw,
        }
    }
}
