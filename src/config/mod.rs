#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_path, validate_positive_number, validate_range,
    validate_url,
};

pub const DEFAULT_API_URL: &str = "https://loteriascaixa-api.herokuapp.com/api/lotofacil";
pub const DEFAULT_OUTPUT_PATH: &str = "data/lotofacil.csv";
pub const DEFAULT_LATEST_PATH: &str = "ultimo";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 20;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY_SECONDS: u64 = 3;
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Checks shared by every configuration source.
pub fn validate_settings<C: ConfigProvider + ?Sized>(config: &C) -> Result<()> {
    validate_url("api_url", config.api_url())?;
    validate_path("output_path", config.output_path())?;
    validate_non_empty_string("latest_path", config.latest_path())?;
    validate_range("timeout_seconds", config.timeout().as_secs(), 1, 300)?;
    validate_positive_number("retry_attempts", config.retry_attempts() as usize, 1)?;
    validate_range("retry_delay_seconds", config.retry_delay().as_secs(), 0, 300)?;
    validate_positive_number("batch_size", config.batch_size(), 1)?;

    let aliases = config.aliases();
    for (field, keys) in [
        ("aliases.number", &aliases.number),
        ("aliases.date", &aliases.date),
        ("aliases.numbers", &aliases.numbers),
    ] {
        validate_positive_number(field, keys.len(), 1)?;
    }

    Ok(())
}
