//! External payment gateway capability.
//!
//! The orchestrator only sees [`PaymentGateway`]; [`StripeClient`] talks to
//! Stripe's PaymentIntents and Refunds API, [`MockGateway`] is an in-process
//! stand-in for local development and tests.

pub mod mock;
pub mod stripe;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub use mock::MockGateway;
pub use stripe::StripeClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway credentials not configured")]
    NotConfigured,

    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    /// An error reported by the gateway itself; the message is shown as-is.
    #[error("{message}")]
    Api {
        code: Option<String>,
        message: String,
    },
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// The gateway's view of an in-progress charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Refund {
    pub id: String,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge intent for `amount` minor units of `currency`.
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError>;

    async fn get_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError>;

    /// Refund `amount` minor units against an intent.
    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: i64,
        reason: Option<&str>,
    ) -> Result<Refund, GatewayError>;
}
