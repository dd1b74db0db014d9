// SPDX-License-Identifier: MIT

use chrono::{Days, NaiveDate, Utc};
use clap::Parser;
use shipsure::app::config::GlobalSettings;
use shipsure::app::logging::setup_logging;
use shipsure::domain::constants::LISTING_DATE_FMT;
use shipsure::domain::error::AppError;
use shipsure::infrastructure::data::db::Database;
use shipsure::infrastructure::network::logistics::LogisticsClient;
use shipsure::infrastructure::network::mailer::Mailer;
use shipsure::infrastructure::network::underwriting::UnderwritingClient;
use shipsure::services::reconcile::pipeline::{Pacing, Pipeline, PipelineConfig};
use shipsure::services::reconcile::scheduler::Scheduler;
use shipsure::services::stats::{spawn_metrics_server, RunStats};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "shipsure reconciliation service")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,

    /// Run a single reconciliation and exit instead of scheduling daily runs
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Explicit target date (DD-MM-YYYY) for a --once run; defaults to yesterday
    #[arg(long)]
    date: Option<String>,

    /// Validate and map only; skip partner submission and persistence
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Metrics port (overrides config/env)
    #[arg(long)]
    metrics_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    if cli.dry_run {
        settings.dry_run = true;
    }
    if let Some(port) = cli.metrics_port {
        settings.metrics_port = port;
    }

    setup_logging(&settings.log_level, settings.log_json);
    tracing::info!(
        target: "startup",
        "shipsure starting\n  variant: {:?}\n  dry_run: {}\n  origin: {}/{}",
        settings.rule_variant,
        settings.dry_run,
        settings.origin_country,
        settings.local_currency
    );

    let db = Database::new(&settings.database_url).await?;
    let source = LogisticsClient::new(&settings.logistics_base_url, &settings.logistics_api_key)?;
    let underwriter =
        UnderwritingClient::new(&settings.underwriting_base_url, &settings.underwriting_api_key)?;
    let notifier = Mailer::new(settings.mailer.clone());
    let stats = Arc::new(RunStats::default());

    let pipeline = Arc::new(Pipeline::new(
        db.clone(),
        source,
        underwriter,
        notifier,
        PipelineConfig {
            variant: settings.rule_variant,
            origin_country: settings.origin_country.clone(),
            local_currency: settings.local_currency.clone(),
            dry_run: settings.dry_run,
            pacing: Pacing::default(),
        },
        stats.clone(),
    ));

    let scheduler = Scheduler::new(pipeline, db, settings.schedule_hour);

    if cli.once {
        let date = match cli.date.as_deref() {
            Some(raw) => NaiveDate::parse_from_str(raw, LISTING_DATE_FMT)
                .map_err(|e| AppError::Config(format!("--date must be DD-MM-YYYY: {e}")))?,
            None => Utc::now()
                .date_naive()
                .checked_sub_days(Days::new(1))
                .ok_or_else(|| AppError::Config("cannot compute yesterday".to_string()))?,
        };
        let report = scheduler.trigger_manual(date).await?;
        tracing::info!(
            target: "startup",
            "Run finished: listed={} valid={} processed={} succeeded={}",
            report.listed,
            report.valid,
            report.capped,
            report.succeeded
        );
        return Ok(());
    }

    let _metrics_addr = spawn_metrics_server(settings.metrics_port, stats.clone()).await;
    tokio::select! {
        _ = scheduler.run() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "startup", "Shutdown signal received");
        }
    }
    Ok(())
}
