use crate::core::{LoadOutcome, Pipeline, Plan, RunReport, RunStatus};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// One run: read the store, plan, then extract/transform/load each batch.
    ///
    /// An unavailable source is not an error; it yields
    /// [`RunStatus::SourceUnavailable`] and leaves the store untouched.
    pub async fn run(&self) -> Result<RunReport> {
        self.monitor.log_stats("Start");

        let mut store = self.pipeline.open_store().await?;
        if store.exists {
            tracing::info!(
                "📦 Current CSV detected: {} row(s), last contest {}",
                store.rows,
                store.last_number
            );
        } else {
            tracing::info!(
                "📦 No CSV at {} yet (first run or different path)",
                self.pipeline.output_path()
            );
        }

        let mut report = RunReport {
            status: RunStatus::Unchanged,
            output_path: self.pipeline.output_path().to_string(),
            records_written: 0,
            records_skipped: 0,
            unusable_payloads: 0,
            last_number: store.last_number,
            interrupted: None,
        };

        let batches = match self.pipeline.plan(&store).await? {
            Plan::Unavailable { reason } => {
                tracing::warn!("🧊 Source unavailable, keeping the current CSV: {}", reason);
                report.status = RunStatus::SourceUnavailable;
                report.interrupted = Some(reason);
                return Ok(report);
            }
            Plan::UpToDate { latest } => {
                tracing::info!("✅ CSV already up to date (latest contest {})", latest);
                return Ok(report);
            }
            Plan::Fetch(batches) => batches,
        };

        let total = batches.len();
        let mut wrote = false;
        let mut dry_run = false;

        for (index, batch) in batches.iter().enumerate() {
            tracing::debug!("Batch {}/{}: {:?}", index + 1, total, batch);

            let extraction = self.pipeline.extract(batch).await?;
            let fetched = extraction.payloads.len();
            self.monitor.log_stats("Extract");

            let result = self.pipeline.transform(extraction.payloads).await?;
            report.records_skipped += result.skipped.len();
            report.unusable_payloads += result.unusable_payloads;
            if result.records.is_empty() && fetched > 0 {
                tracing::warn!("⚠️ No contest could be normalized from this batch, keeping the CSV as is");
            }
            self.monitor.log_stats("Transform");

            match self.pipeline.load(&mut store, result).await? {
                LoadOutcome::Written { rows } => {
                    report.records_written += rows;
                    wrote = true;
                }
                LoadOutcome::DryRun { rows } => {
                    report.records_written += rows;
                    dry_run = true;
                }
                LoadOutcome::Unchanged => {}
            }
            self.monitor.log_stats("Load");

            // rows loaded above stay durable; later batches are abandoned
            if let Some(reason) = extraction.interrupted {
                tracing::warn!("🧊 Source became unavailable: {}", reason);
                report.interrupted = Some(reason);
                break;
            }
        }

        report.last_number = store.last_number;
        report.status = if dry_run {
            RunStatus::DryRun
        } else if wrote {
            RunStatus::Written
        } else if report.interrupted.is_some() {
            RunStatus::SourceUnavailable
        } else {
            RunStatus::Unchanged
        };

        if report.status == RunStatus::Unchanged {
            tracing::info!("✅ CSV already up to date. No changes detected.");
        }
        tracing::info!(
            "📊 Items: {} | last={} | skipped={} | unusable payloads={}",
            store.rows,
            store.last_number,
            report.records_skipped,
            report.unusable_payloads
        );
        self.monitor.log_final_stats();

        Ok(report)
    }
}
