use super::{
    validate_settings, DEFAULT_API_URL, DEFAULT_BATCH_SIZE, DEFAULT_LATEST_PATH,
    DEFAULT_OUTPUT_PATH, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECONDS,
    DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::{ConfigProvider, SyncPolicy};
use crate::domain::model::Backoff;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "lotofacil-etl")]
#[command(about = "Keeps a local CSV of Lotofácil results in sync with a results API")]
pub struct CliConfig {
    /// Results API base URL
    #[arg(long, env = "LOTOFACIL_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// CSV file to create or update
    #[arg(long, env = "OUT_CSV_PATH", default_value = DEFAULT_OUTPUT_PATH)]
    pub output_path: String,

    #[arg(long, value_enum, env = "LOTOFACIL_POLICY", default_value_t = SyncPolicy::FullRefresh)]
    pub policy: SyncPolicy,

    /// Path segment of the latest-contest endpoint (incremental policy)
    #[arg(long, default_value = DEFAULT_LATEST_PATH)]
    pub latest_path: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    /// Total attempts per request
    #[arg(long, default_value_t = DEFAULT_RETRY_ATTEMPTS)]
    pub retry_attempts: u32,

    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_SECONDS)]
    pub retry_delay_seconds: u64,

    #[arg(long, value_enum, default_value_t = Backoff::Fixed)]
    pub backoff: Backoff,

    /// Contests fetched between two writes (incremental policy)
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// TOML configuration file; replaces the source/sync/load flags above
    #[arg(short, long)]
    pub config: Option<String>,

    /// Fetch and merge, but do not write the CSV
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            policy: SyncPolicy::FullRefresh,
            latest_path: DEFAULT_LATEST_PATH.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_seconds: DEFAULT_RETRY_DELAY_SECONDS,
            backoff: Backoff::Fixed,
            batch_size: DEFAULT_BATCH_SIZE,
            config: None,
            dry_run: false,
            verbose: false,
            monitor: false,
            json_logs: false,
        }
    }
}

impl ConfigProvider for CliConfig {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn policy(&self) -> SyncPolicy {
        self.policy
    }

    fn latest_path(&self) -> &str {
        &self.latest_path
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }

    fn backoff(&self) -> Backoff {
        self.backoff
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_settings(self)
    }
}
