use crate::adapters::http::{contest_url, latest_url, FetchOutcome, HttpFetcher};
use crate::adapters::retry::RetryPolicy;
use crate::core::csv_store::{self, WriteMode};
use crate::core::normalize::Normalizer;
use crate::core::{
    Batch, ConfigProvider, Extraction, LoadOutcome, Pipeline, Plan, StoreState, Storage,
    SyncPolicy, TransformResult,
};
use crate::utils::error::{EtlError, Result};

/// Splits `first..=last` into consecutive ranges of at most `size` contests.
pub fn contest_batches(first: u32, last: u32, size: usize) -> Vec<Batch> {
    let size = u32::try_from(size.max(1)).unwrap_or(u32::MAX);
    let mut batches = Vec::new();
    let mut start = first;

    while start <= last {
        let end = start.saturating_add(size - 1).min(last);
        batches.push(Batch::Contests(start..=end));
        if end == u32::MAX {
            break;
        }
        start = end + 1;
    }

    batches
}

pub struct LotofacilPipeline<S: Storage, C: ConfigProvider> {
    pub(crate) storage: S,
    pub(crate) config: C,
    pub(crate) fetcher: HttpFetcher,
    pub(crate) normalizer: Normalizer,
}

impl<S: Storage, C: ConfigProvider> LotofacilPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let retry = RetryPolicy {
            max_attempts: config.retry_attempts(),
            delay: config.retry_delay(),
            backoff: config.backoff(),
        };
        let fetcher = HttpFetcher::new(config.timeout(), retry)?;
        let normalizer = Normalizer::new(config.aliases());

        Ok(Self {
            storage,
            config,
            fetcher,
            normalizer,
        })
    }

    async fn plan_incremental(&self, store: &StoreState) -> Result<Plan> {
        let url = latest_url(self.config.api_url(), self.config.latest_path());
        tracing::info!("🌐 Asking {} for the latest contest", url);

        let payload = match self.fetcher.fetch_json(&url).await {
            FetchOutcome::Json(payload) => payload,
            FetchOutcome::Unavailable { reason, .. } => return Ok(Plan::Unavailable { reason }),
        };

        let latest = self.normalizer.entries(payload).ok().and_then(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_object())
                .filter_map(|fields| self.normalizer.contest_number(fields))
                .max()
        });

        let Some(latest) = latest else {
            return Ok(Plan::Unavailable {
                reason: format!("{} did not report a contest number", url),
            });
        };

        if latest <= store.last_number {
            return Ok(Plan::UpToDate { latest });
        }

        tracing::info!(
            "📥 Contests {}..={} are missing from the CSV",
            store.last_number + 1,
            latest
        );
        Ok(Plan::Fetch(contest_batches(
            store.last_number + 1,
            latest,
            self.config.batch_size(),
        )))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for LotofacilPipeline<S, C> {
    async fn open_store(&self) -> Result<StoreState> {
        let path = self.config.output_path();
        let Some(bytes) = self.storage.read_file(path).await? else {
            return Ok(StoreState::default());
        };

        let (content, parsed) = match String::from_utf8(bytes) {
            Ok(content) => {
                let parsed = csv_store::parse_store(&content);
                (content, parsed)
            }
            Err(e) => {
                let err = EtlError::StoreError {
                    line: 0,
                    message: format!("{} is not UTF-8: {}", path, e),
                };
                (String::from_utf8_lossy(e.as_bytes()).into_owned(), Err(err))
            }
        };

        match (parsed, self.config.policy()) {
            (Ok(store), _) => Ok(store),
            // a full refresh only compares bytes, so the file is rebuilt
            (Err(e), SyncPolicy::FullRefresh) => {
                tracing::warn!("⚠️ {} is unreadable and will be rebuilt: {}", path, e);
                Ok(StoreState {
                    exists: true,
                    content,
                    rows: 0,
                    last_number: 0,
                })
            }
            (Err(e), SyncPolicy::Incremental) => Err(e),
        }
    }

    async fn plan(&self, store: &StoreState) -> Result<Plan> {
        match self.config.policy() {
            SyncPolicy::FullRefresh => Ok(Plan::Fetch(vec![Batch::FullHistory])),
            SyncPolicy::Incremental => self.plan_incremental(store).await,
        }
    }

    async fn extract(&self, batch: &Batch) -> Result<Extraction> {
        match batch {
            Batch::FullHistory => {
                tracing::info!("🌐 Fetching the full contest history");
                Ok(match self.fetcher.fetch_json(self.config.api_url()).await {
                    FetchOutcome::Json(payload) => Extraction {
                        payloads: vec![payload],
                        interrupted: None,
                    },
                    FetchOutcome::Unavailable { reason, .. } => Extraction {
                        payloads: Vec::new(),
                        interrupted: Some(reason),
                    },
                })
            }
            Batch::Contests(range) => {
                tracing::info!("🌐 Fetching contests {}..={}", range.start(), range.end());
                let mut payloads = Vec::new();

                for number in range.clone() {
                    let url = contest_url(self.config.api_url(), number);
                    match self.fetcher.fetch_json(&url).await {
                        FetchOutcome::Json(payload) => payloads.push(payload),
                        FetchOutcome::Unavailable { reason, .. } => {
                            return Ok(Extraction {
                                payloads,
                                interrupted: Some(format!("contest {}: {}", number, reason)),
                            });
                        }
                    }
                }

                Ok(Extraction {
                    payloads,
                    interrupted: None,
                })
            }
        }
    }

    async fn transform(&self, payloads: Vec<serde_json::Value>) -> Result<TransformResult> {
        Ok(self.normalizer.normalize(payloads))
    }

    async fn load(&self, store: &mut StoreState, result: TransformResult) -> Result<LoadOutcome> {
        let change = match self.config.policy() {
            SyncPolicy::FullRefresh => csv_store::full_refresh(store, &result.records)?,
            SyncPolicy::Incremental => csv_store::incremental(store, &result.records)?,
        };

        let Some(change) = change else {
            return Ok(LoadOutcome::Unchanged);
        };

        let path = self.config.output_path();
        let rows = change.rows;

        if self.config.dry_run() {
            tracing::info!(
                "🔍 Dry run: would {} {} row(s) in {}",
                if change.mode == WriteMode::Append { "append" } else { "write" },
                rows,
                path
            );
            change.apply_to(store);
            return Ok(LoadOutcome::DryRun { rows });
        }

        match change.mode {
            WriteMode::Replace => {
                tracing::debug!("Writing {} bytes to {}", change.data.len(), path);
                self.storage.write_file(path, change.data.as_bytes()).await?;
            }
            WriteMode::Append => {
                tracing::debug!("Appending {} bytes to {}", change.data.len(), path);
                self.storage.append_file(path, change.data.as_bytes()).await?;
            }
        }

        change.apply_to(store);
        Ok(LoadOutcome::Written { rows })
    }

    fn output_path(&self) -> &str {
        self.config.output_path()
    }
}
