//! Stripe payment provider client.
//!
//! Uses the PaymentIntents API for charge creation and lookup and the Refunds
//! API for refunds. Requests are form-encoded and authenticated with the
//! secret key from the injected [`StripeConfig`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashMap;
use std::time::Duration;

use super::{GatewayError, PaymentGateway, PaymentIntent, Refund};
use crate::config::StripeConfig;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

/// Stripe API error envelope.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
    message: Option<String>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Check if Stripe is configured (a secret key is set).
    pub fn is_configured(&self) -> bool {
        !self.config.secret_key.expose_secret().is_empty()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_base_url.trim_end_matches('/'), path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> Result<T, GatewayError> {
        if !self.is_configured() {
            return Err(GatewayError::NotConfigured);
        }

        let response = request
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(status = %status, operation, "Stripe response");

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                GatewayError::Transport(format!("Unexpected Stripe response: {}", e))
            })
        } else {
            let detail = serde_json::from_str::<StripeErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(StripeErrorDetail {
                    kind: None,
                    code: None,
                    message: Some(body.clone()),
                });
            tracing::error!(
                status = %status,
                operation,
                kind = ?detail.kind,
                code = ?detail.code,
                "Stripe request failed"
            );
            Err(GatewayError::Api {
                code: detail.code,
                message: detail
                    .message
                    .unwrap_or_else(|| format!("Stripe returned {}", status)),
            })
        }
    }
}

/// Flatten intent parameters into Stripe's bracketed form encoding.
fn intent_form(
    amount: i64,
    currency: &str,
    metadata: &HashMap<String, String>,
) -> Vec<(String, String)> {
    let mut form = vec![
        ("amount".to_string(), amount.to_string()),
        ("currency".to_string(), currency.to_string()),
    ];
    let mut keys: Vec<&String> = metadata.keys().collect();
    keys.sort();
    for key in keys {
        form.push((format!("metadata[{}]", key), metadata[key].clone()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        let request = self
            .client
            .post(self.url("payment_intents"))
            .form(&intent_form(amount, currency, metadata));

        let intent: PaymentIntent = self.send(request, "create_intent").await?;
        tracing::info!(
            payment_intent_id = %intent.id,
            amount = intent.amount,
            currency = %intent.currency,
            "Stripe payment intent created"
        );
        Ok(intent)
    }

    async fn get_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError> {
        let request = self.client.get(self.url(&format!("payment_intents/{}", id)));
        self.send(request, "get_intent").await
    }

    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<Refund, GatewayError> {
        let mut form = vec![
            ("payment_intent".to_string(), payment_intent_id.to_string()),
            ("amount".to_string(), amount.to_string()),
        ];
        if let Some(reason) = reason {
            form.push(("reason".to_string(), reason.to_string()));
        }

        let request = self.client.post(self.url("refunds")).form(&form);
        let refund: Refund = self.send(request, "create_refund").await?;
        tracing::info!(
            refund_id = %refund.id,
            payment_intent_id = %payment_intent_id,
            amount = refund.amount,
            "Stripe refund created"
        );
        Ok(refund)
    }
}
