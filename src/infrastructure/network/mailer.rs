// SPDX-License-Identifier: MIT

//! Outbound administrator mail via an HTTP relay. Delivery problems are
//! logged and swallowed; the pipeline never waits on or fails with mail.

use crate::app::config::MailerSettings;
use crate::domain::models::RunReport;
use crate::services::reconcile::Notifier;
use reqwest::{header, Client};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    settings: MailerSettings,
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a [String],
    subject: String,
    body: String,
}

impl Mailer {
    pub fn new(settings: MailerSettings) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, settings }
    }

    async fn deliver(&self, recipients: &[String], subject: String, body: String) {
        let Some(endpoint) = self.settings.endpoint.as_deref() else {
            tracing::debug!(target: "mailer", "no mail endpoint configured, skipping {subject:?}");
            return;
        };
        if recipients.is_empty() {
            tracing::debug!(target: "mailer", "no recipients, skipping {subject:?}");
            return;
        }

        let message = MailMessage {
            from: &self.settings.from_address,
            to: recipients,
            subject,
            body,
        };
        let mut req = self.client.post(endpoint).json(&message);
        if let Some(token) = &self.settings.api_token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(target: "mailer", "mail sent to {} recipient(s)", recipients.len());
            }
            Ok(resp) => {
                tracing::warn!(target: "mailer", "mail relay responded {}", resp.status());
            }
            Err(e) => {
                tracing::warn!(target: "mailer", "mail delivery failed: {e}");
            }
        }
    }
}

impl Notifier for Mailer {
    async fn send_summary(&self, report: &RunReport, recipients: &[String]) {
        let date = report
            .target_date
            .map(|d| d.format("%d-%m-%Y").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let subject = format!("Shipment reconciliation summary for {date}");

        let mut body = format!(
            "Run for {date}\n\nListed: {}\nValid: {}\nProcessed: {}\nSucceeded: {}\nSkipped over cap: {}\nSuccess rate: {:.1}%\n",
            report.listed,
            report.valid,
            report.capped,
            report.succeeded,
            report.skipped_over_cap,
            report.success_rate_pct()
        );
        if !report.failures.is_empty() {
            body.push_str("\nRejected or failed shipments:\n");
            for (awb, reason) in &report.failures {
                body.push_str(&format!("  {awb}: {reason}\n"));
            }
        }

        self.deliver(recipients, subject, body).await;
    }

    async fn send_failure_alert(&self, job_name: &str, context: &str, recipients: &[String]) {
        let subject = format!("[ALERT] {job_name} failed");
        let body = format!("Job {job_name} aborted.\n\n{context}\n");
        self.deliver(recipients, subject, body).await;
    }
}
