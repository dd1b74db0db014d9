// SPDX-License-Identifier: MIT

//! Client for the insurance underwriting partner. One authenticated POST
//! per shipment; no retries. A transient failure fails that shipment only.

use crate::domain::error::AppError;
use crate::domain::models::{UnderwritingPayload, UnderwritingResult};
use crate::services::reconcile::UnderwritingApi;
use reqwest::{header, Client, Url};
use serde::Deserialize;
use std::time::Duration;

const PROVIDER: &str = "underwriting";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status flags the partner documents as successful issuance.
const SUCCESS_STATUSES: [&str; 2] = ["SUCCESS", "ISSUED"];

#[derive(Clone)]
pub struct UnderwritingClient {
    client: Client,
    submit_url: Url,
    api_key: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    policy_id: String,
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    document_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl UnderwritingClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::Config(format!("underwriting_base_url: {e}")))?;
        let submit_url = base
            .join("policies/quote")
            .map_err(|e| AppError::Config(format!("underwriting submit endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Initialization(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            client,
            submit_url,
            api_key: api_key.to_string(),
        })
    }
}

impl UnderwritingApi for UnderwritingClient {
    async fn submit(&self, payload: &UnderwritingPayload) -> Result<UnderwritingResult, AppError> {
        let resp = self
            .client
            .post(self.submit_url.clone())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Connection {
                provider: PROVIDER.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(AppError::ApiCall {
                provider: PROVIDER.to_string(),
                status: resp.status().as_u16(),
            });
        }

        let body: SubmitResponse = resp.json().await.map_err(|e| AppError::Connection {
            provider: PROVIDER.to_string(),
            reason: format!("malformed response: {e}"),
        })?;

        // Success requires both a recognized status flag and a non-empty
        // policy id; any other shape fails this shipment.
        let recognized = SUCCESS_STATUSES
            .iter()
            .any(|s| body.status.eq_ignore_ascii_case(s));
        if !recognized || body.policy_id.trim().is_empty() {
            return Err(AppError::Partner(format!(
                "status={:?} policyId={:?} message={}",
                body.status,
                body.policy_id,
                body.message.unwrap_or_default()
            )));
        }

        Ok(UnderwritingResult {
            awb: payload.shipment.awb.clone(),
            policy_id: body.policy_id,
            amount: body.amount.unwrap_or(payload.shipment.value.amount),
            currency: payload.shipment.value.currency.clone(),
            status: body.status,
            document_url: body.document_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_case_insensitive() {
        assert!(SUCCESS_STATUSES.iter().any(|s| "issued".eq_ignore_ascii_case(s)));
        assert!(!SUCCESS_STATUSES.iter().any(|s| "PENDING".eq_ignore_ascii_case(s)));
    }
}
