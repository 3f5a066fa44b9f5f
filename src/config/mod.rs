use std::time::Duration;

use serde::Deserialize;

use crate::services::progress::ProgressPolicy;
use crate::services::runner::RunnerConfig;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:5003").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// DeepL API authentication key
    pub deepl_api_key: String,

    /// DeepL API base URL (use https://api-free.deepl.com/v2 for free accounts)
    #[serde(default = "default_deepl_api_url")]
    pub deepl_api_url: String,

    /// Directory holding uploaded sources and translated outputs
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Source language code sent to the provider
    #[serde(default = "default_source_lang")]
    pub source_lang: String,

    /// Seconds between provider status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum seconds to wait for a translation before failing the job
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Minimum perceived processing time; faster jobs are stretched out
    #[serde(default = "default_min_processing_secs")]
    pub min_processing_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:5003".to_string()
}

fn default_deepl_api_url() -> String {
    "https://api.deepl.com/v2".to_string()
}

fn default_upload_dir() -> String {
    "public_uploads".to_string()
}

fn default_source_lang() -> String {
    "PT".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_max_wait_secs() -> u64 {
    3600
}

fn default_min_processing_secs() -> u64 {
    20
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            source_lang: self.source_lang.clone(),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            max_wait: Duration::from_secs(self.max_wait_secs),
            progress: ProgressPolicy {
                min_processing: Duration::from_secs(self.min_processing_secs),
                ..ProgressPolicy::default()
            },
            ..RunnerConfig::default()
        }
    }
}
