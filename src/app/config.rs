// SPDX-License-Identifier: MIT

use crate::domain::error::AppError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Which generation of business rules a deployment runs. The two rule sets
/// coexist in production; a deployment picks exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleVariant {
    /// Cutoff->CIP pickup window, static carrier, no value/service checks.
    CipWindow,
    /// Strict pre-cutoff pickup, carrier routing table, minimum USD value.
    CutoffCarrier,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailerSettings {
    /// HTTP mail-relay endpoint. Absent endpoint disables outbound mail.
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    #[serde(default = "default_mail_from")]
    pub from_address: String,
}

impl Default for MailerSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token: None,
            from_address: default_mail_from(),
        }
    }
}

/// Service-level configuration from file + environment. Per-run business
/// settings (allow-lists, cutoff times, caps) live in the database and are
/// snapshotted separately each run.
#[derive(Debug, Clone, Deserialize)]
pub struct GlobalSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,

    // Logistics platform
    pub logistics_base_url: String,
    pub logistics_api_key: String,

    // Underwriting partner
    pub underwriting_base_url: String,
    pub underwriting_api_key: String,

    #[serde(default)]
    pub mailer: MailerSettings,

    #[serde(default = "default_rule_variant")]
    pub rule_variant: RuleVariant,

    /// Fallback daily trigger hour (local), used when the settings row
    /// carries no CIP time to derive the schedule from.
    #[serde(default = "default_schedule_hour")]
    pub schedule_hour: u32,

    #[serde(default = "default_origin_country")]
    pub origin_country: String,
    #[serde(default = "default_local_currency")]
    pub local_currency: String,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_false")]
    pub dry_run: bool,
}

fn default_database_url() -> String {
    "sqlite://shipsure.db".to_string()
}
fn default_rule_variant() -> RuleVariant {
    RuleVariant::CipWindow
}
fn default_schedule_hour() -> u32 {
    1
}
fn default_origin_country() -> String {
    "IN".to_string()
}
fn default_local_currency() -> String {
    "INR".to_string()
}
fn default_metrics_port() -> u16 {
    9200
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_mail_from() -> String {
    "reports@shipsure.local".to_string()
}
fn default_false() -> bool {
    false
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        let mut builder = Config::builder();

        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env > config file.
        builder = builder.add_source(Environment::with_prefix("SHIPSURE").separator("__"));

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    fn validate(&self) -> Result<(), AppError> {
        for (name, raw) in [
            ("logistics_base_url", &self.logistics_base_url),
            ("underwriting_base_url", &self.underwriting_base_url),
        ] {
            Url::parse(raw)
                .map_err(|e| AppError::Config(format!("{name} is not a valid URL: {e}")))?;
        }
        if let Some(endpoint) = &self.mailer.endpoint {
            Url::parse(endpoint)
                .map_err(|e| AppError::Config(format!("mailer.endpoint is not a valid URL: {e}")))?;
        }
        if self.logistics_api_key.trim().is_empty() {
            return Err(AppError::Config("logistics_api_key is missing".to_string()));
        }
        if self.underwriting_api_key.trim().is_empty() {
            return Err(AppError::Config(
                "underwriting_api_key is missing".to_string(),
            ));
        }
        if self.schedule_hour > 23 {
            return Err(AppError::Config(format!(
                "schedule_hour must be 0-23, got {}",
                self.schedule_hour
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> GlobalSettings {
        GlobalSettings {
            database_url: default_database_url(),
            logistics_base_url: "https://logistics.example.com/api/".to_string(),
            logistics_api_key: "k1".to_string(),
            underwriting_base_url: "https://underwriter.example.com/".to_string(),
            underwriting_api_key: "k2".to_string(),
            mailer: MailerSettings::default(),
            rule_variant: RuleVariant::CipWindow,
            schedule_hour: 1,
            origin_country: default_origin_country(),
            local_currency: default_local_currency(),
            metrics_port: default_metrics_port(),
            log_level: default_log_level(),
            log_json: false,
            dry_run: false,
        }
    }

    #[test]
    fn rejects_bad_urls_and_blank_keys() {
        let mut s = base();
        s.logistics_base_url = "not a url".to_string();
        assert!(s.validate().is_err());

        let mut s = base();
        s.underwriting_api_key = "  ".to_string();
        assert!(s.validate().is_err());

        let mut s = base();
        s.schedule_hour = 24;
        assert!(s.validate().is_err());

        assert!(base().validate().is_ok());
    }
}
