// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Connection failed to {provider}: {reason}")]
    Connection { provider: String, reason: String },

    #[error("Underwriting partner rejected submission: {0}")]
    Partner(String),

    #[error("Reconciliation settings missing or invalid: {0}")]
    Settings(String),

    #[error("Pipeline failure: {0}")]
    Pipeline(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Category tag for durable error-log rows. Systemic failures only;
/// per-shipment validation rejections never reach the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    DatabaseError,
    ApiError,
    CronFailure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::DatabaseError => "database_error",
            ErrorCategory::ApiError => "api_error",
            ErrorCategory::CronFailure => "cron_failure",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
