// SPDX-License-Identifier: MIT

use crate::domain::error::{AppError, ErrorCategory};
use crate::domain::models::{RunSettings, UnderwritingResult};
use crate::infrastructure::data::schema::{ErrorLogRecord, ShipmentRecord};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Initialization(format!("DB connect failed: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::Initialization(format!("DB connect failed: {}", e)))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Initialization(format!("DB migration failed: {}", e)))?;

        Ok(Self { pool })
    }

    /// Load the business-settings snapshot for a run. `Ok(None)` means no
    /// settings row exists yet; invariant violations fail the load.
    pub async fn load_settings(&self) -> Result<Option<RunSettings>, AppError> {
        let row = sqlx::query(
            r#"
            SELECT suppliers, countries, cutoff_time, cip_time, min_value_usd,
                   usd_rate, max_shipments, recipients, email_enabled
            FROM reconcile_settings WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Settings load failed: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let suppliers: Vec<String> = decode_json_list(row.get("suppliers"), "suppliers")?;
        let countries_raw: Vec<String> = decode_json_list(row.get("countries"), "countries")?;
        let countries: HashSet<String> = countries_raw
            .into_iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .collect();
        let recipients: Vec<String> = decode_json_list(row.get("recipients"), "recipients")?;

        let cutoff_raw: String = row.get("cutoff_time");
        let cutoff_minutes = crate::common::timewin::parse_minutes(&cutoff_raw)
            .ok_or_else(|| AppError::Settings(format!("bad cutoff_time {:?}", cutoff_raw)))?;
        let cip_raw: Option<String> = row.get("cip_time");
        let cip_minutes = match cip_raw {
            Some(ref raw) => Some(
                crate::common::timewin::parse_minutes(raw)
                    .ok_or_else(|| AppError::Settings(format!("bad cip_time {:?}", raw)))?,
            ),
            None => None,
        };

        let usd_rate: f64 = row.get("usd_rate");
        if usd_rate <= 0.0 {
            return Err(AppError::Settings(format!(
                "usd_rate must be positive, got {usd_rate}"
            )));
        }
        let max_shipments: i64 = row.get("max_shipments");
        if max_shipments < 0 {
            return Err(AppError::Settings(format!(
                "max_shipments must be non-negative, got {max_shipments}"
            )));
        }
        let email_enabled: bool = row.get("email_enabled");
        if email_enabled && recipients.is_empty() {
            return Err(AppError::Settings(
                "email enabled but no recipients configured".to_string(),
            ));
        }

        Ok(Some(RunSettings {
            suppliers,
            countries,
            cutoff_minutes,
            cip_minutes,
            min_value_usd: row.get("min_value_usd"),
            usd_rate,
            max_shipments: max_shipments as usize,
            recipients,
            email_enabled,
        }))
    }

    /// Idempotent by AWB: reprocessing a shipment overwrites the prior row
    /// (last write wins) instead of duplicating it.
    pub async fn upsert_shipment(
        &self,
        supplier_name: &str,
        destination: &str,
        result: &UnderwritingResult,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO shipments (awb, supplier_name, destination, policy_id, amount, currency, document_url)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(awb) DO UPDATE SET
                supplier_name=excluded.supplier_name,
                destination=excluded.destination,
                policy_id=excluded.policy_id,
                amount=excluded.amount,
                currency=excluded.currency,
                document_url=excluded.document_url,
                updated_at=CURRENT_TIMESTAMP
            "#,
        )
        .bind(&result.awb)
        .bind(supplier_name)
        .bind(destination)
        .bind(&result.policy_id)
        .bind(result.amount)
        .bind(&result.currency)
        .bind(&result.document_url)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Shipment upsert failed: {}", e)))?;
        Ok(())
    }

    /// Append-only systemic error log. Never updates prior rows.
    pub async fn append_error(
        &self,
        job_name: &str,
        category: ErrorCategory,
        message: &str,
        detail: serde_json::Value,
        execution_date: NaiveDate,
        awb: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO error_log (job_name, category, message, detail, execution_date, awb)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(job_name)
        .bind(category.as_str())
        .bind(message)
        .bind(detail.to_string())
        .bind(execution_date.format("%Y-%m-%d").to_string())
        .bind(awb)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error-log append failed: {}", e)))?;
        Ok(())
    }

    /// Viewer query: persisted shipment outcomes in an updated-at window,
    /// optionally narrowed to one supplier.
    pub async fn shipments_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        supplier: Option<&str>,
    ) -> Result<Vec<ShipmentRecord>, AppError> {
        let from_ts = from.format("%Y-%m-%d 00:00:00").to_string();
        let to_ts = to.format("%Y-%m-%d 23:59:59").to_string();
        let recs = match supplier {
            Some(name) => {
                sqlx::query_as::<_, ShipmentRecord>(
                    r#"
                    SELECT * FROM shipments
                    WHERE updated_at BETWEEN ? AND ? AND supplier_name = ?
                    ORDER BY updated_at DESC
                    "#,
                )
                .bind(&from_ts)
                .bind(&to_ts)
                .bind(name)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, ShipmentRecord>(
                    "SELECT * FROM shipments WHERE updated_at BETWEEN ? AND ? ORDER BY updated_at DESC",
                )
                .bind(&from_ts)
                .bind(&to_ts)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(format!("Shipment query failed: {}", e)))?;
        Ok(recs)
    }

    /// Viewer query: error-log rows by execution date range.
    pub async fn errors_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ErrorLogRecord>, AppError> {
        let recs = sqlx::query_as::<_, ErrorLogRecord>(
            "SELECT * FROM error_log WHERE execution_date BETWEEN ? AND ? ORDER BY id DESC",
        )
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Error-log query failed: {}", e)))?;
        Ok(recs)
    }

    /// Write path used by the dashboard collaborator (and tests): replace
    /// the single settings row.
    pub async fn save_settings(&self, update: &SettingsUpdate) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO reconcile_settings
                (id, suppliers, countries, cutoff_time, cip_time, min_value_usd,
                 usd_rate, max_shipments, recipients, email_enabled)
            VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                suppliers=excluded.suppliers,
                countries=excluded.countries,
                cutoff_time=excluded.cutoff_time,
                cip_time=excluded.cip_time,
                min_value_usd=excluded.min_value_usd,
                usd_rate=excluded.usd_rate,
                max_shipments=excluded.max_shipments,
                recipients=excluded.recipients,
                email_enabled=excluded.email_enabled,
                updated_at=CURRENT_TIMESTAMP
            "#,
        )
        .bind(encode_json_list(&update.suppliers)?)
        .bind(encode_json_list(&update.countries)?)
        .bind(&update.cutoff_time)
        .bind(&update.cip_time)
        .bind(update.min_value_usd)
        .bind(update.usd_rate)
        .bind(update.max_shipments)
        .bind(encode_json_list(&update.recipients)?)
        .bind(update.email_enabled)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Settings save failed: {}", e)))?;
        Ok(())
    }
}

fn encode_json_list(items: &[String]) -> Result<String, AppError> {
    serde_json::to_string(items)
        .map_err(|e| AppError::Database(format!("settings list encode failed: {e}")))
}

fn decode_json_list(raw: String, field: &str) -> Result<Vec<String>, AppError> {
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Settings(format!("bad {field} list in settings row: {e}")))
}

/// Raw settings-row contents as the dashboard writes them.
#[derive(Debug, Clone)]
pub struct SettingsUpdate {
    pub suppliers: Vec<String>,
    pub countries: Vec<String>,
    pub cutoff_time: String,
    pub cip_time: Option<String>,
    pub min_value_usd: f64,
    pub usd_rate: f64,
    pub max_shipments: i64,
    pub recipients: Vec<String>,
    pub email_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::UnderwritingResult;

    fn seed() -> SettingsUpdate {
        SettingsUpdate {
            suppliers: vec!["ACME".to_string()],
            countries: vec!["us".to_string(), "GB".to_string()],
            cutoff_time: "19:00:00".to_string(),
            cip_time: Some("23:30:00".to_string()),
            min_value_usd: 20.0,
            usd_rate: 83.0,
            max_shipments: 50,
            recipients: vec!["ops@example.com".to_string()],
            email_enabled: true,
        }
    }

    fn result(awb: &str, amount: f64) -> UnderwritingResult {
        UnderwritingResult {
            awb: awb.to_string(),
            policy_id: format!("POL-{awb}"),
            amount,
            currency: "INR".to_string(),
            status: "ISSUED".to_string(),
            document_url: None,
        }
    }

    #[tokio::test]
    async fn settings_round_trip_normalizes_countries() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.save_settings(&seed()).await.unwrap();
        let s = db.load_settings().await.unwrap().expect("settings row");
        assert!(s.countries.contains("US"));
        assert!(s.countries.contains("GB"));
        assert_eq!(s.cutoff_minutes, 19 * 60);
        assert_eq!(s.cip_minutes, Some(23 * 60 + 30));
        assert_eq!(s.max_shipments, 50);
    }

    #[tokio::test]
    async fn missing_settings_row_is_none() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        assert!(db.load_settings().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn settings_invariants_fail_the_load() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut bad = seed();
        bad.usd_rate = 0.0;
        db.save_settings(&bad).await.unwrap();
        assert!(matches!(
            db.load_settings().await,
            Err(AppError::Settings(_))
        ));

        let mut bad = seed();
        bad.email_enabled = true;
        bad.recipients = vec![];
        db.save_settings(&bad).await.unwrap();
        assert!(matches!(
            db.load_settings().await,
            Err(AppError::Settings(_))
        ));
    }

    #[tokio::test]
    async fn upsert_is_idempotent_last_write_wins() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.upsert_shipment("ACME Corp", "US", &result("AWB1", 100.0))
            .await
            .unwrap();
        db.upsert_shipment("ACME Corp", "US", &result("AWB1", 250.0))
            .await
            .unwrap();

        let today = chrono::Utc::now().date_naive();
        let rows = db.shipments_between(today, today, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].awb, "AWB1");
        assert_eq!(rows[0].amount, 250.0);
    }

    #[tokio::test]
    async fn error_log_is_append_only_and_date_filtered() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 25).unwrap();
        for i in 0..2 {
            db.append_error(
                "daily_shipment_reconcile",
                ErrorCategory::ApiError,
                &format!("listing failed ({i})"),
                serde_json::json!({"attempt": i}),
                date,
                None,
            )
            .await
            .unwrap();
        }
        let rows = db.errors_between(date, date).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.category == "api_error"));

        let none = db
            .errors_between(
                chrono::NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn supplier_filter_narrows_shipment_query() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.upsert_shipment("ACME Corp", "US", &result("AWB1", 10.0))
            .await
            .unwrap();
        db.upsert_shipment("Globex", "GB", &result("AWB2", 20.0))
            .await
            .unwrap();
        let today = chrono::Utc::now().date_naive();
        let rows = db
            .shipments_between(today, today, Some("Globex"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].awb, "AWB2");
    }
}
