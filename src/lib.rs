pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use adapters::storage::LocalStorage;
pub use app::pipelines::lotofacil_pipeline::LotofacilPipeline;
pub use crate::core::etl::EtlEngine;
pub use crate::core::{ConfigProvider, ContestRecord, Pipeline, RunReport, RunStatus, Storage, SyncPolicy};
pub use utils::error::{EtlError, Result};
