// SPDX-License-Identifier: MIT

use chrono::NaiveDateTime;
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct ShipmentRecord {
    pub awb: String,
    pub supplier_name: String,
    pub destination: String,
    pub policy_id: String,
    pub amount: f64,
    pub currency: String,
    pub document_url: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, FromRow)]
pub struct ErrorLogRecord {
    pub id: i64,
    pub job_name: String,
    pub category: String,
    pub message: String,
    pub detail: Option<String>,
    pub execution_date: String,
    pub awb: Option<String>,
    pub created_at: NaiveDateTime,
}
