// SPDX-License-Identifier: MIT

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;

/// Immutable business-settings snapshot for one pipeline run, loaded from
/// the single `reconcile_settings` row the admin dashboard maintains.
/// Cutoff/CIP times are pre-parsed to minutes since midnight.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub suppliers: Vec<String>,
    /// Destination allow-list, uppercased for case-insensitive membership.
    pub countries: HashSet<String>,
    pub cutoff_minutes: u32,
    pub cip_minutes: Option<u32>,
    pub min_value_usd: f64,
    /// USD -> local currency. Always > 0 (enforced on load).
    pub usd_rate: f64,
    pub max_shipments: usize,
    pub recipients: Vec<String>,
    pub email_enabled: bool,
}

/// Air waybill - the shipment tracking code. Unique per physical shipment
/// and the idempotency key for persisted outcomes.
pub type Awb = String;

/// Full shipment record fetched from the logistics platform.
/// Immutable once fetched within a run.
#[derive(Debug, Clone)]
pub struct ShipmentDetail {
    pub awb: Awb,
    pub pickup_time: NaiveDateTime,
    pub destination_country: String,
    /// Declared value in the local currency of the logistics platform.
    pub declared_value: f64,
    pub goods_description: String,
    pub service_type: String,
    pub customer_id: String,
}

#[derive(Debug, Clone)]
pub struct CustomerAddress {
    pub label: String,
    pub country: String,
}

/// Customer record linked from a shipment. A missing customer is tolerated
/// upstream and surfaces here as `CustomerDetail::default()`.
#[derive(Debug, Clone, Default)]
pub struct CustomerDetail {
    pub company_name: String,
    pub email: String,
    pub addresses: Vec<CustomerAddress>,
}

/// Why a shipment was rejected during validation. Closed set; the string
/// forms are what run reports and summary mails show to administrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    DestinationNotAllowed,
    ServiceUnsupported,
    PickupOutOfWindow,
    ValueBelowThreshold,
    SupplierNotAllowed,
    LookupFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::DestinationNotAllowed => "destination-not-allowed",
            RejectReason::ServiceUnsupported => "service-unsupported",
            RejectReason::PickupOutOfWindow => "pickup-time-out-of-window",
            RejectReason::ValueBelowThreshold => "value-below-threshold",
            RejectReason::SupplierNotAllowed => "supplier-not-allowed",
            RejectReason::LookupFailed => "lookup-failed",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-shipment validation outcome, held only in run memory.
#[derive(Debug, Clone)]
pub struct ValidationVerdict {
    pub awb: Awb,
    pub rejection: Option<RejectReason>,
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Request schema of the underwriting partner. Field names are the partner's
/// wire contract; do not rename without a partner-side migration.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnderwritingPayload {
    pub transport_mode: String,
    pub shipment: PayloadShipment,
    pub customer_name: String,
    pub customer_country: String,
    pub customer_email: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PayloadShipment {
    pub awb: Awb,
    pub departure_date: String,
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    pub carrier_code: String,
    pub value: PayloadValue,
    pub goods_description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PayloadValue {
    pub amount: f64,
    pub currency: String,
}

/// Outcome of one accepted underwriting submission.
#[derive(Debug, Clone)]
pub struct UnderwritingResult {
    pub awb: Awb,
    pub policy_id: String,
    pub amount: f64,
    /// Always the local currency of the source shipment.
    pub currency: String,
    pub status: String,
    pub document_url: Option<String>,
}

/// Aggregate outcome of one pipeline run, returned to the caller and used
/// to render the summary mail.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub target_date: Option<NaiveDate>,
    pub listed: usize,
    pub valid: usize,
    pub capped: usize,
    pub succeeded: usize,
    /// Valid shipments dropped by the per-run cap (counted, not logged).
    pub skipped_over_cap: usize,
    /// Every invalid or failed item: (awb, human-readable reason).
    pub failures: Vec<(Awb, String)>,
}

impl RunReport {
    pub fn success_rate_pct(&self) -> f64 {
        if self.capped == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.capped as f64 * 100.0
    }
}
