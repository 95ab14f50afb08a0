pub mod csv_store;
pub mod etl;
pub mod normalize;

pub use crate::domain::model::{
    Batch, ContestRecord, Extraction, LoadOutcome, Plan, RunReport, RunStatus, StoreState,
    SyncPolicy, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
