use super::{
    validate_settings, DEFAULT_BATCH_SIZE, DEFAULT_LATEST_PATH, DEFAULT_RETRY_ATTEMPTS,
    DEFAULT_RETRY_DELAY_SECONDS, DEFAULT_TIMEOUT_SECONDS,
};
use crate::core::normalize::AliasTable;
use crate::core::{ConfigProvider, SyncPolicy};
use crate::domain::model::Backoff;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub sync: Option<SyncConfig>,
    pub normalize: Option<AliasTable>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub latest_path: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
    pub backoff: Option<Backoff>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub policy: Option<SyncPolicy>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub dry_run: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${LOTOFACIL_API_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    /// `--dry-run` on the command line wins over the file.
    pub fn force_dry_run(&mut self) {
        self.load.dry_run = Some(true);
    }
}

impl ConfigProvider for TomlConfig {
    fn api_url(&self) -> &str {
        &self.source.endpoint
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn policy(&self) -> SyncPolicy {
        self.sync
            .as_ref()
            .and_then(|s| s.policy)
            .unwrap_or_default()
    }

    fn latest_path(&self) -> &str {
        self.source
            .latest_path
            .as_deref()
            .unwrap_or(DEFAULT_LATEST_PATH)
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.source
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        )
    }

    fn retry_attempts(&self) -> u32 {
        self.source.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }

    fn retry_delay(&self) -> Duration {
        Duration::from_secs(
            self.source
                .retry_delay_seconds
                .unwrap_or(DEFAULT_RETRY_DELAY_SECONDS),
        )
    }

    fn backoff(&self) -> Backoff {
        self.source.backoff.unwrap_or_default()
    }

    fn batch_size(&self) -> usize {
        self.sync
            .as_ref()
            .and_then(|s| s.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
    }

    fn dry_run(&self) -> bool {
        self.load.dry_run.unwrap_or(false)
    }

    fn aliases(&self) -> AliasTable {
        self.normalize.clone().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        for value in [&self.source.endpoint, &self.load.output_path] {
            if let Some(var) = unresolved_placeholder(value) {
                return Err(EtlError::MissingConfigError {
                    field: format!("environment variable {}", var),
                });
            }
        }
        validate_settings(self)
    }
}

/// Name of the first `${VAR}` left in `value` after substitution.
fn unresolved_placeholder(value: &str) -> Option<&str> {
    let start = value.find("${")? + 2;
    let len = value[start..].find('}')?;
    Some(&value[start..start + len])
}
