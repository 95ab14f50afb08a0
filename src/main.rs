use clap::Parser;
use lotofacil_etl::utils::{logger, validation::Validate};
use lotofacil_etl::{
    CliConfig, ConfigProvider, EtlEngine, LocalStorage, LotofacilPipeline, RunReport, RunStatus,
    TomlConfig,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.json_logs);

    tracing::info!("Starting lotofacil-etl v{}", env!("CARGO_PKG_VERSION"));
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let result = match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            let mut config = match TomlConfig::from_file(&path) {
                Ok(config) => config,
                Err(e) => fail(e),
            };
            if cli.dry_run {
                config.force_dry_run();
            }
            let monitor = cli.monitor || config.monitoring_enabled();

            tracing::info!("📋 Pipeline: {}", config.pipeline.name);
            if let Some(description) = &config.pipeline.description {
                tracing::info!("📝 Description: {}", description);
            }
            execute(config, monitor).await
        }
        None => {
            let monitor = cli.monitor;
            execute(cli, monitor).await
        }
    };

    match result {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(e) => fail(e),
    }
}

async fn execute<C>(config: C, monitor: bool) -> lotofacil_etl::Result<RunReport>
where
    C: ConfigProvider + Validate,
{
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    tracing::info!("🌐 Source: {}", config.api_url());
    tracing::info!("📄 Output: {}", config.output_path());
    tracing::info!("🔁 Policy: {:?}", config.policy());
    if config.dry_run() {
        tracing::info!("🔍 Dry run: the CSV will not be written");
    }
    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = LotofacilPipeline::new(LocalStorage::default(), config)?;
    EtlEngine::new_with_monitoring(pipeline, monitor).run().await
}

fn print_summary(report: &RunReport) {
    match report.status {
        RunStatus::Written => {
            println!(
                "✅ {} row(s) written to {} (last contest {})",
                report.records_written, report.output_path, report.last_number
            );
        }
        RunStatus::Unchanged => {
            println!("✅ {} already up to date (last contest {})", report.output_path, report.last_number);
        }
        RunStatus::SourceUnavailable => {
            println!("🧊 Source unavailable, {} kept as is", report.output_path);
        }
        RunStatus::DryRun => {
            println!(
                "🔍 Dry run: {} row(s) would be written to {}",
                report.records_written, report.output_path
            );
        }
    }

    if let Some(reason) = &report.interrupted {
        println!("⚠️ Stopped early: {}", reason);
    }
    if report.records_skipped > 0 {
        println!("⚠️ {} record(s) skipped during normalization", report.records_skipped);
    }
    if report.unusable_payloads > 0 {
        println!(
            "⚠️ {} payload(s) had an unexpected shape and were ignored",
            report.unusable_payloads
        );
    }
}

fn fail(e: lotofacil_etl::EtlError) -> ! {
    tracing::error!(
        "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code())
}
