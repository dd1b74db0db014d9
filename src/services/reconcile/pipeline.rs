// SPDX-License-Identifier: MIT

//! Two-phase reconciliation run: validate every listed shipment, cap the
//! valid set, then process the capped subset. One logical worker; all
//! external calls are sequential and paced.

use crate::app::config::RuleVariant;
use crate::domain::constants::{
    JOB_NAME_DAILY, LOOKUP_PACING, SUBMIT_PACING, SUMMARY_SUCCESS_RATE_PCT,
};
use crate::domain::error::{AppError, ErrorCategory};
use crate::domain::models::{
    CustomerDetail, RejectReason, RunReport, RunSettings, ShipmentDetail,
};
use crate::infrastructure::data::db::Database;
use crate::services::reconcile::{payload, validator, Notifier, ShipmentSource, UnderwritingApi};
use crate::services::stats::RunStats;
use chrono::{Days, NaiveDate, Utc};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Inter-call delays. The defaults are the partner APIs' de facto
/// throttling contract; tests zero them out.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub lookup: Duration,
    pub submit: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            lookup: LOOKUP_PACING,
            submit: SUBMIT_PACING,
        }
    }
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            lookup: Duration::ZERO,
            submit: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub variant: RuleVariant,
    pub origin_country: String,
    pub local_currency: String,
    pub dry_run: bool,
    pub pacing: Pacing,
}

pub struct Pipeline<S, U, N> {
    db: Database,
    source: S,
    underwriter: U,
    notifier: N,
    config: PipelineConfig,
    stats: Arc<RunStats>,
}

struct AcceptedShipment {
    detail: ShipmentDetail,
    customer: CustomerDetail,
}

impl<S, U, N> Pipeline<S, U, N>
where
    S: ShipmentSource,
    U: UnderwritingApi,
    N: Notifier,
{
    pub fn new(
        db: Database,
        source: S,
        underwriter: U,
        notifier: N,
        config: PipelineConfig,
        stats: Arc<RunStats>,
    ) -> Self {
        Self {
            db,
            source,
            underwriter,
            notifier,
            config,
            stats,
        }
    }

    /// Scheduled entry point: reconcile yesterday's shipments.
    pub async fn run_yesterday(&self) -> Result<RunReport, AppError> {
        let yesterday = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| AppError::Pipeline("date underflow computing yesterday".to_string()))?;
        self.run_for_date(yesterday).await
    }

    /// Reconcile one explicit date. Manual and scheduled runs share this
    /// path, including the validate-all-then-cap ordering.
    pub async fn run_for_date(&self, date: NaiveDate) -> Result<RunReport, AppError> {
        self.stats.runs_started.fetch_add(1, Ordering::Relaxed);
        tracing::info!(target: "pipeline", "Starting reconciliation run for {date}");

        let settings = match self.db.load_settings().await {
            Ok(Some(s)) => s,
            Ok(None) => {
                let err = AppError::Settings("no settings row configured".to_string());
                self.abort(date, ErrorCategory::CronFailure, &err, None).await;
                return Err(err);
            }
            Err(err) => {
                self.abort(date, ErrorCategory::CronFailure, &err, None).await;
                return Err(err);
            }
        };

        // Listing failure is systemic: log, alert, abort the run.
        let listed = match self.source.list_shipments(date, date).await {
            Ok(awbs) => awbs,
            Err(err) => {
                self.abort(date, ErrorCategory::ApiError, &err, Some(&settings))
                    .await;
                return Err(err);
            }
        };
        self.stats
            .shipments_listed
            .fetch_add(listed.len() as u64, Ordering::Relaxed);
        tracing::info!(target: "pipeline", "Listed {} shipment(s) for {date}", listed.len());

        // Phase one: validate ALL listed shipments, not just the capped
        // subset, so the invalid list in the report is complete.
        let mut accepted: Vec<AcceptedShipment> = Vec::new();
        let mut failures: Vec<(String, String)> = Vec::new();
        for awb in &listed {
            match self.lookup(awb).await {
                Ok((detail, customer)) => {
                    match validator::validate(&detail, &customer, &settings, self.config.variant) {
                        Ok(()) => accepted.push(AcceptedShipment { detail, customer }),
                        Err(reason) => {
                            tracing::debug!(target: "pipeline", "{awb} rejected: {reason}");
                            failures.push((awb.clone(), reason.to_string()));
                        }
                    }
                }
                // Per-shipment fetch problems are verdicts, never systemic.
                Err(err) => {
                    tracing::warn!(target: "pipeline", "{awb} lookup failed: {err}");
                    failures.push((awb.clone(), RejectReason::LookupFailed.to_string()));
                }
            }
            sleep(self.config.pacing.lookup).await;
        }

        let valid = accepted.len();
        self.stats
            .shipments_valid
            .fetch_add(valid as u64, Ordering::Relaxed);

        // Cap in original listing order; the overflow is counted, not logged.
        let skipped_over_cap = valid.saturating_sub(settings.max_shipments);
        accepted.truncate(settings.max_shipments);
        if skipped_over_cap > 0 {
            tracing::info!(
                target: "pipeline",
                "Cap {} reached, skipping {skipped_over_cap} valid shipment(s)",
                settings.max_shipments
            );
        }

        // Phase two: process the capped subset only.
        let capped = accepted.len();
        let mut succeeded = 0usize;
        for item in &accepted {
            match self.process(item, &settings).await {
                Ok(()) => succeeded += 1,
                Err(err) => {
                    tracing::warn!(target: "pipeline", "{} processing failed: {err}", item.detail.awb);
                    failures.push((item.detail.awb.clone(), err.to_string()));
                }
            }
            sleep(self.config.pacing.submit).await;
        }

        self.stats
            .shipments_succeeded
            .fetch_add(succeeded as u64, Ordering::Relaxed);
        self.stats
            .shipments_failed
            .fetch_add((capped - succeeded) as u64, Ordering::Relaxed);

        let report = RunReport {
            target_date: Some(date),
            listed: listed.len(),
            valid,
            capped,
            succeeded,
            skipped_over_cap,
            failures,
        };
        tracing::info!(
            target: "pipeline",
            "Run for {date} complete: listed={} valid={} processed={} succeeded={} rate={:.1}%",
            report.listed,
            report.valid,
            report.capped,
            report.succeeded,
            report.success_rate_pct()
        );

        // Below the floor is ordinary business variance, not an alert.
        if settings.email_enabled
            && report.capped > 0
            && report.success_rate_pct() >= SUMMARY_SUCCESS_RATE_PCT
        {
            self.notifier
                .send_summary(&report, &settings.recipients)
                .await;
        }

        Ok(report)
    }

    async fn lookup(&self, awb: &str) -> Result<(ShipmentDetail, CustomerDetail), AppError> {
        let detail = self.source.shipment_detail(awb).await?;
        // A missing customer record is tolerated as an empty one.
        let customer = self
            .source
            .customer_detail(&detail.customer_id)
            .await?
            .unwrap_or_default();
        Ok((detail, customer))
    }

    async fn process(
        &self,
        item: &AcceptedShipment,
        settings: &RunSettings,
    ) -> Result<(), AppError> {
        let ctx = payload::MapperContext {
            origin_country: &self.config.origin_country,
            local_currency: &self.config.local_currency,
            variant: self.config.variant,
        };
        let request = payload::map(&item.detail, &item.customer, &ctx);

        if self.config.dry_run {
            tracing::info!(target: "pipeline", "[dry-run] would submit {}", item.detail.awb);
            return Ok(());
        }

        let result = self.underwriter.submit(&request).await?;
        if let Err(err) = self
            .db
            .upsert_shipment(
                &item.customer.company_name,
                &request.shipment.destination,
                &result,
            )
            .await
        {
            // Persistence failure after issuance is durable-logged with the
            // AWB so an operator can reconcile the policy by hand.
            if let Err(log_err) = self
                .db
                .append_error(
                    JOB_NAME_DAILY,
                    ErrorCategory::DatabaseError,
                    &err.to_string(),
                    serde_json::json!({ "policy_id": result.policy_id }),
                    item.detail.pickup_time.date(),
                    Some(&item.detail.awb),
                )
                .await
            {
                tracing::error!(target: "pipeline", "error-log append failed: {log_err}");
            }
            return Err(err);
        }
        Ok(())
    }

    /// Systemic failure path: durable log + failure alert. Secondary
    /// failures here must not mask the original error.
    async fn abort(
        &self,
        date: NaiveDate,
        category: ErrorCategory,
        err: &AppError,
        settings: Option<&RunSettings>,
    ) {
        self.stats.runs_failed.fetch_add(1, Ordering::Relaxed);
        tracing::error!(target: "pipeline", "Run for {date} aborted ({category}): {err}");

        if let Err(log_err) = self
            .db
            .append_error(
                JOB_NAME_DAILY,
                category,
                &err.to_string(),
                serde_json::json!({ "target_date": date.to_string() }),
                date,
                None,
            )
            .await
        {
            tracing::error!(target: "pipeline", "error-log append failed: {log_err}");
        }

        let recipients = settings
            .filter(|s| s.email_enabled)
            .map(|s| s.recipients.as_slice())
            .unwrap_or(&[]);
        if !recipients.is_empty() {
            self.notifier
                .send_failure_alert(
                    JOB_NAME_DAILY,
                    &format!("Run for {date} aborted: {err}"),
                    recipients,
                )
                .await;
        }
    }
}
