// SPDX-License-Identifier: MIT

//! Daily trigger loop. Fires once per day at the configured initiation
//! time and runs the pipeline for the previous day. A failed run is logged
//! (and already durably recorded by the pipeline) and the loop continues;
//! the process stays alive for the next attempt.

use crate::infrastructure::data::db::Database;
use crate::services::reconcile::pipeline::Pipeline;
use crate::services::reconcile::{Notifier, ShipmentSource, UnderwritingApi};
use chrono::{NaiveDateTime, TimeDelta, Timelike, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct Scheduler<S, U, N> {
    pipeline: Arc<Pipeline<S, U, N>>,
    db: Database,
    fallback_hour: u32,
    // Only one run in flight at a time, scheduled or manual.
    run_lock: Mutex<()>,
}

impl<S, U, N> Scheduler<S, U, N>
where
    S: ShipmentSource,
    U: UnderwritingApi,
    N: Notifier,
{
    pub fn new(pipeline: Arc<Pipeline<S, U, N>>, db: Database, fallback_hour: u32) -> Self {
        Self {
            pipeline,
            db,
            fallback_hour,
            run_lock: Mutex::new(()),
        }
    }

    pub async fn run(&self) {
        loop {
            let wait = self.until_next_trigger().await;
            tracing::info!(
                target: "scheduler",
                "Next reconciliation run in {}s",
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;

            let _guard = self.run_lock.lock().await;
            if let Err(e) = self.pipeline.run_yesterday().await {
                // Already durably logged and alerted by the pipeline.
                tracing::error!(target: "scheduler", "Scheduled run failed: {e}");
            }
        }
    }

    /// Ad hoc run for an explicit date, serialized against the scheduled
    /// runs by the same lock.
    pub async fn trigger_manual(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<crate::domain::models::RunReport, crate::domain::error::AppError> {
        let _guard = self.run_lock.lock().await;
        self.pipeline.run_for_date(date).await
    }

    /// Trigger time comes from the settings row's CIP time when present,
    /// else the configured fallback hour. Settings problems here fall back
    /// silently; the pipeline surfaces them properly at run time.
    async fn until_next_trigger(&self) -> Duration {
        let trigger_minutes = match self.db.load_settings().await {
            Ok(Some(s)) => s.cip_minutes.unwrap_or(self.fallback_hour * 60),
            _ => self.fallback_hour * 60,
        };
        let delta = time_until(Utc::now().naive_utc(), trigger_minutes);
        delta.to_std().unwrap_or(Duration::from_secs(60))
    }
}

/// Delta from `now` to the next occurrence of `target_minutes` past
/// midnight, always in the future (same time tomorrow if already passed).
fn time_until(now: NaiveDateTime, target_minutes: u32) -> TimeDelta {
    let now_minutes = now.time().hour() * 60 + now.time().minute();
    let mut delta = TimeDelta::minutes(target_minutes as i64 - now_minutes as i64)
        - TimeDelta::seconds(now.time().second() as i64);
    if delta <= TimeDelta::zero() {
        delta += TimeDelta::days(1);
    }
    delta
}
