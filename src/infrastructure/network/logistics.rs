// SPDX-License-Identifier: MIT

//! Thin asynchronous client for the logistics platform API.
//!
//! Lists AWBs for a date range and fetches shipment/customer detail
//! records. All calls are paced by the orchestrator, not here.

use crate::domain::constants::LISTING_DATE_FMT;
use crate::domain::error::AppError;
use crate::domain::models::{Awb, CustomerAddress, CustomerDetail, ShipmentDetail};
use crate::services::reconcile::ShipmentSource;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::{header, Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "logistics";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct LogisticsClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

#[derive(Deserialize, Debug)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ListingEntry {
    awb: Awb,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ShipmentDto {
    awb: Awb,
    pickup_time: String,
    destination_country: String,
    declared_value: f64,
    #[serde(default)]
    goods_description: String,
    service_type: String,
    customer_id: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CustomerDto {
    #[serde(default)]
    company_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    addresses: Vec<AddressDto>,
}

#[derive(Deserialize, Debug)]
struct AddressDto {
    #[serde(default)]
    label: String,
    #[serde(default)]
    country: String,
}

impl LogisticsClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("logistics_base_url: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Config(format!("logistics endpoint {path}: {e}")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, AppError> {
        let resp = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| AppError::Connection {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(AppError::ApiCall {
                provider: PROVIDER.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let envelope: Envelope<T> = resp.json().await.map_err(|e| AppError::Connection {
            provider: PROVIDER.to_string(),
            reason: format!("malformed response: {e}"),
        })?;
        if !envelope.status.eq_ignore_ascii_case("ok") {
            return Err(AppError::Partner(format!(
                "{PROVIDER} status={} message={}",
                envelope.status,
                envelope.message.unwrap_or_default()
            )));
        }
        Ok(envelope.data)
    }
}

impl ShipmentSource for LogisticsClient {
    async fn list_shipments(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Awb>, AppError> {
        let mut url = self.endpoint("shipments")?;
        url.query_pairs_mut()
            .append_pair("fromDate", &from.format(LISTING_DATE_FMT).to_string())
            .append_pair("toDate", &to.format(LISTING_DATE_FMT).to_string());

        let entries: Vec<ListingEntry> = self.get_json(url).await?.unwrap_or_default();
        Ok(entries.into_iter().map(|e| e.awb).collect())
    }

    async fn shipment_detail(&self, awb: &str) -> Result<ShipmentDetail, AppError> {
        let url = self.endpoint(&format!("shipments/{awb}"))?;
        let dto: ShipmentDto = self.get_json(url).await?.ok_or_else(|| AppError::ApiCall {
            provider: PROVIDER.to_string(),
            status: 404,
        })?;
        dto.try_into()
    }

    async fn customer_detail(&self, customer_id: &str) -> Result<Option<CustomerDetail>, AppError> {
        let url = self.endpoint(&format!("customers/{customer_id}"))?;
        let dto: Option<CustomerDto> = self.get_json(url).await?;
        Ok(dto.map(CustomerDetail::from))
    }
}

impl TryFrom<ShipmentDto> for ShipmentDetail {
    type Error = AppError;

    fn try_from(dto: ShipmentDto) -> Result<Self, AppError> {
        let pickup_time = parse_pickup(&dto.pickup_time).ok_or_else(|| {
            AppError::Partner(format!(
                "{PROVIDER} returned unparseable pickupTime {:?} for {}",
                dto.pickup_time, dto.awb
            ))
        })?;
        Ok(ShipmentDetail {
            awb: dto.awb,
            pickup_time,
            destination_country: dto.destination_country,
            declared_value: dto.declared_value,
            goods_description: dto.goods_description,
            service_type: dto.service_type,
            customer_id: dto.customer_id,
        })
    }
}

impl From<CustomerDto> for CustomerDetail {
    fn from(dto: CustomerDto) -> Self {
        CustomerDetail {
            company_name: dto.company_name,
            email: dto.email,
            addresses: dto
                .addresses
                .into_iter()
                .map(|a| CustomerAddress {
                    label: a.label,
                    country: a.country,
                })
                .collect(),
        }
    }
}

fn parse_pickup(raw: &str) -> Option<NaiveDateTime> {
    // The platform emits "YYYY-MM-DD HH:MM:SS"; older records use a T
    // separator.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}
