// SPDX-License-Identifier: MIT

//! Daily shipment reconciliation: listing, validation, payload mapping,
//! underwriting submission, persistence and notification.

pub mod payload;
pub mod pipeline;
pub mod scheduler;
pub mod validator;

use crate::domain::error::AppError;
use crate::domain::models::{
    Awb, CustomerDetail, RunReport, ShipmentDetail, UnderwritingPayload, UnderwritingResult,
};
use chrono::NaiveDate;

/// Logistics platform boundary. One implementation talks HTTP; tests plug
/// in-memory doubles into the pipeline.
pub trait ShipmentSource {
    fn list_shipments(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<Awb>, AppError>> + Send;

    fn shipment_detail(
        &self,
        awb: &str,
    ) -> impl std::future::Future<Output = Result<ShipmentDetail, AppError>> + Send;

    /// `Ok(None)` when the customer record does not exist; tolerated by
    /// the caller, never fatal.
    fn customer_detail(
        &self,
        customer_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<CustomerDetail>, AppError>> + Send;
}

/// Underwriting partner boundary.
pub trait UnderwritingApi {
    fn submit(
        &self,
        payload: &UnderwritingPayload,
    ) -> impl std::future::Future<Output = Result<UnderwritingResult, AppError>> + Send;
}

/// Administrator notification boundary. Infallible by contract: delivery
/// problems are the implementation's to log and swallow.
pub trait Notifier {
    fn send_summary(
        &self,
        report: &RunReport,
        recipients: &[String],
    ) -> impl std::future::Future<Output = ()> + Send;

    fn send_failure_alert(
        &self,
        job_name: &str,
        context: &str,
        recipients: &[String],
    ) -> impl std::future::Future<Output = ()> + Send;
}
