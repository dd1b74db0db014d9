// SPDX-License-Identifier: MIT

//! Pure transform from an accepted shipment + customer record into the
//! underwriting partner's request schema.

use crate::app::config::RuleVariant;
use crate::common::business_days::add_business_days;
use crate::domain::constants::{carrier_route, DEFAULT_CARRIER};
use crate::domain::models::{
    CustomerDetail, PayloadShipment, PayloadValue, ShipmentDetail, UnderwritingPayload,
};

const REGISTERED_ADDRESS_LABEL: &str = "Registered Address";
const TRANSPORT_MODE: &str = "AIR";

pub struct MapperContext<'a> {
    pub origin_country: &'a str,
    pub local_currency: &'a str,
    pub variant: RuleVariant,
}

pub fn map(
    shipment: &ShipmentDetail,
    customer: &CustomerDetail,
    ctx: &MapperContext<'_>,
) -> UnderwritingPayload {
    let (carrier_code, eta) = match ctx.variant {
        RuleVariant::CutoffCarrier => {
            match carrier_route(&shipment.service_type, &shipment.destination_country) {
                Some(route) => {
                    let eta_date =
                        add_business_days(shipment.pickup_time.date(), route.transit_business_days);
                    // Calendar date kept, clock replaced by the midnight marker.
                    (
                        route.code.to_string(),
                        Some(format!("{}T00:00:00", eta_date.format("%Y-%m-%d"))),
                    )
                }
                // Unroutable shipments are rejected upstream; mapping one
                // anyway falls back to the static carrier.
                None => (DEFAULT_CARRIER.to_string(), None),
            }
        }
        RuleVariant::CipWindow => (DEFAULT_CARRIER.to_string(), None),
    };

    UnderwritingPayload {
        transport_mode: TRANSPORT_MODE.to_string(),
        shipment: PayloadShipment {
            awb: shipment.awb.clone(),
            departure_date: shipment.pickup_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            origin: ctx.origin_country.to_string(),
            destination: shipment.destination_country.trim().to_ascii_uppercase(),
            eta,
            carrier_code,
            value: PayloadValue {
                amount: shipment.declared_value,
                currency: ctx.local_currency.to_string(),
            },
            goods_description: shipment.goods_description.clone(),
        },
        customer_name: customer.company_name.clone(),
        customer_country: registered_country(customer, ctx.origin_country),
        customer_email: customer.email.clone(),
    }
}

/// Country of the address labelled "Registered Address" (label match is
/// case-insensitive); defaults to the shipment's source country.
fn registered_country(customer: &CustomerDetail, origin_country: &str) -> String {
    customer
        .addresses
        .iter()
        .find(|a| a.label.trim().eq_ignore_ascii_case(REGISTERED_ADDRESS_LABEL))
        .map(|a| a.country.clone())
        .unwrap_or_else(|| origin_country.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CustomerAddress;
    use chrono::NaiveDateTime;

    fn ctx(variant: RuleVariant) -> MapperContext<'static> {
        MapperContext {
            origin_country: "IN",
            local_currency: "INR",
            variant,
        }
    }

    fn shipment() -> ShipmentDetail {
        ShipmentDetail {
            awb: "AWB1".to_string(),
            // Thursday.
            pickup_time: NaiveDateTime::parse_from_str("2026-08-20 20:15:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            destination_country: "gb".to_string(),
            declared_value: 5_000.0,
            goods_description: "textiles".to_string(),
            service_type: "ShipD".to_string(),
            customer_id: "C1".to_string(),
        }
    }

    #[test]
    fn carrier_variant_computes_weekend_skipping_eta() {
        let payload = map(
            &shipment(),
            &CustomerDetail::default(),
            &ctx(RuleVariant::CutoffCarrier),
        );
        assert_eq!(payload.shipment.carrier_code, "SPD-UK");
        // Thu 2026-08-20 + 8 business days -> Tue 2026-09-01, at midnight.
        assert_eq!(payload.shipment.eta.as_deref(), Some("2026-09-01T00:00:00"));
        assert_eq!(payload.shipment.destination, "GB");
        assert_eq!(payload.shipment.origin, "IN");
        assert_eq!(payload.shipment.value.currency, "INR");
    }

    #[test]
    fn window_variant_uses_static_carrier_without_eta() {
        let payload = map(
            &shipment(),
            &CustomerDetail::default(),
            &ctx(RuleVariant::CipWindow),
        );
        assert_eq!(payload.shipment.carrier_code, DEFAULT_CARRIER);
        assert_eq!(payload.shipment.eta, None);
    }

    #[test]
    fn registered_address_label_wins_over_origin_default() {
        let customer = CustomerDetail {
            company_name: "ACME Corp".to_string(),
            email: "ops@acme.example".to_string(),
            addresses: vec![
                CustomerAddress {
                    label: "Billing".to_string(),
                    country: "SG".to_string(),
                },
                CustomerAddress {
                    label: "registered address".to_string(),
                    country: "US".to_string(),
                },
            ],
        };
        let payload = map(&shipment(), &customer, &ctx(RuleVariant::CipWindow));
        assert_eq!(payload.customer_country, "US");

        let payload = map(
            &shipment(),
            &CustomerDetail::default(),
            &ctx(RuleVariant::CipWindow),
        );
        assert_eq!(payload.customer_country, "IN");
    }

    #[test]
    fn payload_serializes_to_partner_field_names() {
        let payload = map(
            &shipment(),
            &CustomerDetail::default(),
            &ctx(RuleVariant::CutoffCarrier),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["transportMode"], "AIR");
        assert_eq!(json["shipment"]["carrierCode"], "SPD-UK");
        assert_eq!(json["shipment"]["value"]["currency"], "INR");
        assert!(json["customerName"].is_string());
    }
}
