use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use super::{GatewayError, PaymentGateway, PaymentIntent, Refund};

/// Mock gateway for local development and testing.
///
/// Issues sequential `pi_mock_N` / `re_mock_N` ids and remembers the intents
/// it created so lookups of unknown ids fail the way Stripe's do.
#[derive(Default)]
pub struct MockGateway {
    failure: Option<String>,
    intent_count: AtomicU64,
    refund_count: AtomicU64,
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway that rejects every call with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn intent_count(&self) -> u64 {
        self.intent_count.load(Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> u64 {
        self.refund_count.load(Ordering::SeqCst)
    }

    pub fn intent(&self, id: &str) -> Option<PaymentIntent> {
        self.intents
            .lock()
            .ok()
            .and_then(|intents| intents.get(id).cloned())
    }

    fn check_failure(&self) -> Result<(), GatewayError> {
        match &self.failure {
            Some(message) => Err(GatewayError::Api {
                code: Some("mock_failure".to_string()),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        amount: i64,
        currency: &str,
        metadata: &HashMap<String, String>,
    ) -> Result<PaymentIntent, GatewayError> {
        self.check_failure()?;

        let n = self.intent_count.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("pi_mock_{}", n);
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id: id.clone(),
            status: "requires_payment_method".to_string(),
            amount,
            currency: currency.to_string(),
            metadata: metadata.clone(),
        };

        tracing::info!(payment_intent_id = %id, amount, "[MOCK] Payment intent created");

        self.intents
            .lock()
            .map_err(|_| GatewayError::Transport("mock gateway state poisoned".to_string()))?
            .insert(id, intent.clone());
        Ok(intent)
    }

    async fn get_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError> {
        self.check_failure()?;

        self.intent(id).ok_or_else(|| GatewayError::Api {
            code: Some("resource_missing".to_string()),
            message: format!("No such payment_intent: '{}'", id),
        })
    }

    async fn create_refund(
        &self,
        payment_intent_id: &str,
        amount: i64,
        _reason: Option<&str>,
    ) -> Result<Refund, GatewayError> {
        self.check_failure()?;

        let n = self.refund_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(payment_intent_id = %payment_intent_id, amount, "[MOCK] Refund created");

        Ok(Refund {
            id: format!("re_mock_{}", n),
            amount,
            status: Some("succeeded".to_string()),
            payment_intent: Some(payment_intent_id.to_string()),
        })
    }
}
