use crate::domain::model::{
    Backoff, Batch, Extraction, LoadOutcome, Plan, StoreState, SyncPolicy, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    /// `Ok(None)` when the file does not exist yet.
    fn read_file(
        &self,
        path: &str,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn append_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn policy(&self) -> SyncPolicy;
    fn latest_path(&self) -> &str;
    fn timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn backoff(&self) -> Backoff;
    fn batch_size(&self) -> usize;
    fn dry_run(&self) -> bool;
    fn aliases(&self) -> crate::core::normalize::AliasTable {
        crate::core::normalize::AliasTable::default()
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn open_store(&self) -> Result<StoreState>;
    async fn plan(&self, store: &StoreState) -> Result<Plan>;
    async fn extract(&self, batch: &Batch) -> Result<Extraction>;
    async fn transform(&self, payloads: Vec<serde_json::Value>) -> Result<TransformResult>;
    async fn load(&self, store: &mut StoreState, result: TransformResult) -> Result<LoadOutcome>;
    fn output_path(&self) -> &str;
}
