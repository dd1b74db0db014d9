// SPDX-License-Identifier: MIT

use std::time::Duration;

// =============================================================================
// PACING CONSTANTS
// =============================================================================

// The logistics and underwriting APIs have no documented rate limit; these
// delays are the de facto throttling contract agreed with both partners.
pub const LOOKUP_PACING: Duration = Duration::from_millis(300);
pub const SUBMIT_PACING: Duration = Duration::from_millis(1000);

// =============================================================================
// PIPELINE CONSTANTS
// =============================================================================

/// Success-rate floor (percent) below which no summary mail is sent.
pub const SUMMARY_SUCCESS_RATE_PCT: f64 = 80.0;

pub const JOB_NAME_DAILY: &str = "daily_shipment_reconcile";

/// Date format used by the logistics listing API.
pub const LISTING_DATE_FMT: &str = "%d-%m-%Y";

// =============================================================================
// CARRIER TABLE (cutoff-carrier variant)
// =============================================================================

pub const SERVICE_SHIP_PLUS: &str = "Ship+";
pub const SERVICE_SHIP_DOMESTIC: &str = "ShipD";

/// Carrier used by the cip-window variant, which computes no ETA.
pub const DEFAULT_CARRIER: &str = "GEN-AIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierRoute {
    pub code: &'static str,
    pub transit_business_days: u32,
}

/// Fixed service-type x destination routing table. Unknown combinations
/// have no carrier and are rejected by the cutoff-carrier validator.
pub fn carrier_route(service_type: &str, destination: &str) -> Option<CarrierRoute> {
    let dest = destination.trim().to_ascii_uppercase();
    let service = service_type.trim();
    match (service, dest.as_str()) {
        (SERVICE_SHIP_PLUS, "USA" | "US") => Some(CarrierRoute {
            code: "SPL-US",
            transit_business_days: 15,
        }),
        (SERVICE_SHIP_DOMESTIC, "USA" | "US") => Some(CarrierRoute {
            code: "SPD-US",
            transit_business_days: 12,
        }),
        (SERVICE_SHIP_PLUS, "UK" | "GB") => Some(CarrierRoute {
            code: "SPL-UK",
            transit_business_days: 10,
        }),
        (SERVICE_SHIP_DOMESTIC, "UK" | "GB") => Some(CarrierRoute {
            code: "SPD-UK",
            transit_business_days: 8,
        }),
        _ => None,
    }
}
