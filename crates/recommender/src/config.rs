//! Recommender configuration
//!
//! Values come from an optional file named by `RECOMMENDER_CONFIG_FILE`,
//! overridden by `RECOMMENDER_*` environment variables. Nested keys use a
//! double underscore, e.g. `RECOMMENDER_EXPERIMENT__DATASOURCE`.

use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use recommender_lib::cluster::VpaResourceConfig;
use recommender_lib::extractor::HistoryPolicy;
use recommender_lib::kruize::{ExperimentTemplate, KruizeClientConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_ENV: &str = "RECOMMENDER_CONFIG_FILE";
const ENV_PREFIX: &str = "RECOMMENDER";

/// Recommender configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RecommenderConfig {
    /// Name VPAs list in `spec.recommenders` to opt in
    #[serde(default = "default_recommender_name")]
    pub recommender_name: String,

    /// Delay between two reconciliation passes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Kruize service base URL
    #[serde(default = "default_kruize_url")]
    pub kruize_url: String,

    /// Timeout for each Kruize and Kubernetes call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_vpa_group")]
    pub vpa_group: String,

    #[serde(default = "default_vpa_version")]
    pub vpa_version: String,

    #[serde(default = "default_vpa_plural")]
    pub vpa_plural: String,

    /// CRD kind checked at startup
    #[serde(default = "default_vpa_kind")]
    pub vpa_kind: String,

    #[serde(default)]
    pub history_policy: HistoryPolicy,

    /// Defaults for experiments registered with Kruize
    #[serde(default)]
    pub experiment: ExperimentTemplate,
}

fn default_recommender_name() -> String {
    "kruize".to_string()
}

fn default_poll_interval() -> u64 {
    60
}

fn default_kruize_url() -> String {
    KruizeClientConfig::default().base_url
}

fn default_request_timeout() -> u64 {
    30
}

fn default_api_port() -> u16 {
    8080
}

fn default_vpa_group() -> String {
    VpaResourceConfig::default().group
}

fn default_vpa_version() -> String {
    VpaResourceConfig::default().version
}

fn default_vpa_plural() -> String {
    VpaResourceConfig::default().plural
}

fn default_vpa_kind() -> String {
    VpaResourceConfig::default().kind
}

impl RecommenderConfig {
    /// Load configuration from the process environment and optional config file
    pub fn load() -> Result<Self> {
        let file = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::from_sources(file.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    /// Layer `env` over `file` and validate the result
    pub fn from_sources(file: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read recommender configuration")?
            .try_deserialize()
            .context("invalid recommender configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.recommender_name.trim().is_empty(),
            "recommender_name must not be empty"
        );
        ensure!(self.poll_interval_secs > 0, "poll_interval_secs must be positive");
        ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn kruize_client(&self) -> KruizeClientConfig {
        KruizeClientConfig {
            base_url: self.kruize_url.clone(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn vpa_resource(&self) -> VpaResourceConfig {
        VpaResourceConfig {
            group: self.vpa_group.clone(),
            version: self.vpa_version.clone(),
            plural: self.vpa_plural.clone(),
            kind: self.vpa_kind.clone(),
        }
    }
}
