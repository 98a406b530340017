use clap::Parser;
use nba_db_updater::adapters::http::HttpSource;
use nba_db_updater::utils::error::ErrorSeverity;
use nba_db_updater::utils::{logger, validation::Validate};
use nba_db_updater::{
    AdapterTable, CliConfig, Dispatcher, GatedFetcher, RateLimiter, UpdateError, UpdateReport,
};
use std::path::PathBuf;
use std::sync::Arc;

async fn run(cli: &CliConfig, target: PathBuf) -> Result<UpdateReport, UpdateError> {
    let config = cli.load()?;
    config.validate()?;
    tracing::info!("✅ Configuration loaded and validated");

    let root = config.database_root(&target)?;
    tracing::info!("📁 Database root: {}", root.display());

    let source = Arc::new(HttpSource::new(config.http_settings()?)?);
    let mut adapters = AdapterTable::new();
    for kind in source.kinds() {
        adapters.register(kind, source.clone());
    }

    let fetcher = GatedFetcher::new(RateLimiter::new(config.rate_limit_settings()), adapters);
    let mut dispatcher = Dispatcher::new(root, fetcher, config.update.on_cut.policy())
        .skip_fresh(config.skip_fresh());

    dispatcher.dispatch(&target).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting nba-db-updater");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let target = if cli.path.is_absolute() {
        cli.path.clone()
    } else {
        std::env::current_dir()?.join(&cli.path)
    };

    let exit_code = match run(&cli, target).await {
        Ok(report) => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }

            if report.is_success() {
                0
            } else {
                // Failed artifacts kept their old ledger entries; a re-run retries them.
                2
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Update failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
