use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::error;

use crate::application::usecases::lifecycle::{GatewayRefund, PaymentGateway};

/// Minimal refund client for the payment gateway, built on reqwest. Amounts
/// are whole minor units, same as the rest of the system.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorEnvelope {
    error: GatewayErrorDetails,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetails {
    code: Option<String>,
    description: Option<String>,
    reason: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            key_id,
            key_secret,
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body = match resp.text().await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => "<empty response body>".to_string(),
            Err(err) => format!("<failed to read response body: {err}>"),
        };

        let (gateway_error_code, gateway_error_description, gateway_error_reason) =
            match serde_json::from_str::<GatewayErrorEnvelope>(&body) {
                Ok(envelope) => (
                    envelope.error.code,
                    envelope.error.description,
                    envelope.error.reason,
                ),
                Err(_) => (None, None, None),
            };

        error!(
            status = %status,
            gateway_error_code = ?gateway_error_code,
            gateway_error_description = ?gateway_error_description,
            gateway_error_reason = ?gateway_error_reason,
            response_body = %body,
            context = %context,
            "payment gateway request failed"
        );

        anyhow::bail!(
            "payment gateway request failed: {} (status {})",
            context,
            status
        );
    }
}

#[async_trait]
impl PaymentGateway for GatewayClient {
    async fn create_refund(
        &self,
        payment_reference: &str,
        amount_minor: i64,
        notes: HashMap<String, String>,
    ) -> Result<GatewayRefund> {
        let body = serde_json::json!({
            "amount": amount_minor,
            "notes": notes,
        });

        let resp = self
            .http
            .post(format!(
                "{}/payments/{}/refund",
                self.base_url, payment_reference
            ))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, "create refund").await?;

        let raw_response: serde_json::Value = resp.json().await?;

        #[derive(Deserialize)]
        struct RefundResp {
            id: String,
        }

        let parsed: RefundResp = serde_json::from_value(raw_response.clone())?;
        Ok(GatewayRefund {
            refund_id: parsed.id,
            raw_response,
        })
    }
}
