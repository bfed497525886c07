//! Payment use cases: sequence a gateway call with a store read or write and
//! map the result to a response DTO.
//!
//! Nothing here retries or compensates. When the gateway call succeeds and
//! the following store write fails, the two systems are left out of step and
//! the error is returned to the caller as-is.

use std::collections::HashMap;
use std::sync::Arc;

use super::gateway::{GatewayError, PaymentGateway};
use super::metrics::{record_gateway_error, record_payment_event};
use super::repository::PaymentStore;
use crate::dtos::{CreatePayment, PaymentIntentResponse, PaymentResponse, RefundPayment};
use crate::error::PaymentError;
use crate::models::{to_minor_units, Payment, PaymentFilter, StatusChange};

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    currency: String,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            currency: currency.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn PaymentStore> {
        &self.store
    }

    /// Open a gateway intent and record a `PENDING` payment for it.
    #[tracing::instrument(
        skip(self, input),
        fields(order_id = input.order_id, user_id = input.user_id)
    )]
    pub async fn create_payment_intent(
        &self,
        input: CreatePayment,
    ) -> Result<PaymentIntentResponse, PaymentError> {
        let metadata = HashMap::from([
            ("orderId".to_string(), input.order_id.to_string()),
            ("userId".to_string(), input.user_id.to_string()),
        ]);
        let amount = to_minor_units(input.amount)?;

        let intent = self
            .gateway
            .create_intent(amount, &self.currency, &metadata)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create payment intent");
                record_gateway_error("create_intent");
                e
            })?;
        let client_secret = intent.client_secret.clone().ok_or_else(|| {
            tracing::error!(
                payment_intent_id = %intent.id,
                "Payment intent returned without a client secret"
            );
            record_gateway_error("create_intent");
            GatewayError::Transport(format!(
                "payment intent {} has no client secret",
                intent.id
            ))
        })?;

        let payment = Payment::pending(
            input.order_id,
            input.user_id,
            input.amount,
            input.method,
            intent.id.clone(),
        );
        let id = self.store.insert(payment).await.map_err(|e| {
            tracing::error!(
                error = %e,
                payment_intent_id = %intent.id,
                "Payment intent created but payment could not be saved"
            );
            e
        })?;

        record_payment_event("created");
        tracing::info!(
            payment_id = %id,
            payment_intent_id = %intent.id,
            amount = input.amount,
            "Payment intent created"
        );

        Ok(PaymentIntentResponse {
            client_secret,
            payment_intent_id: intent.id,
        })
    }

    /// Mark the payment behind `payment_intent_id` as completed once the
    /// gateway resolves the intent.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_payment(
        &self,
        payment_intent_id: &str,
    ) -> Result<PaymentResponse, PaymentError> {
        let intent = self
            .gateway
            .get_intent(payment_intent_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to retrieve payment intent");
                record_gateway_error("get_intent");
                e
            })?;
        tracing::debug!(gateway_status = %intent.status, "Payment intent retrieved");

        let payment = self
            .store
            .find_and_update_status(
                PaymentFilter::PaymentIntentId(payment_intent_id.to_string()),
                StatusChange::completed(intent.id.clone()),
            )
            .await?;

        record_payment_event("confirmed");
        tracing::info!(payment_intent_id, "Payment confirmed");
        Ok(PaymentResponse::from(payment))
    }

    /// Refund a stored payment at the gateway and mark it refunded.
    ///
    /// The refund amount is not compared with the original amount; partial
    /// and over-sized refunds alike leave the payment `REFUNDED`.
    #[tracing::instrument(skip(self, input), fields(amount = input.amount))]
    pub async fn refund_payment(
        &self,
        id: &str,
        input: RefundPayment,
    ) -> Result<PaymentResponse, PaymentError> {
        let payment = self.store.find_by_id(id).await?;
        let object_id = payment.id.ok_or_else(|| {
            PaymentError::Store("stored payment is missing its id".to_string())
        })?;

        let refund = self
            .gateway
            .create_refund(
                &payment.payment_intent_id,
                to_minor_units(input.amount)?,
                input.reason.as_deref(),
            )
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create refund");
                record_gateway_error("create_refund");
                e
            })?;

        let payment = self
            .store
            .find_and_update_status(
                PaymentFilter::Id(object_id),
                StatusChange::refunded(refund.id.clone()),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    refund_id = %refund.id,
                    "Refund issued but payment status not saved"
                );
                e
            })?;

        record_payment_event("refunded");
        tracing::info!(refund_id = %refund.id, "Payment refunded");
        Ok(PaymentResponse::from(payment))
    }

    pub async fn get_payment_by_order_id(
        &self,
        order_id: i64,
    ) -> Result<PaymentResponse, PaymentError> {
        let payment = self.store.find_by_order_id(order_id).await?;
        Ok(PaymentResponse::from(payment))
    }

    pub async fn get_payment_by_id(&self, id: &str) -> Result<PaymentResponse, PaymentError> {
        let payment = self.store.find_by_id(id).await?;
        Ok(PaymentResponse::from(payment))
    }

    pub async fn get_payments_by_user_id(
        &self,
        user_id: i64,
    ) -> Result<Vec<PaymentResponse>, PaymentError> {
        let payments = self.store.find_many_by_user_id(user_id).await?;
        Ok(payments.into_iter().map(PaymentResponse::from).collect())
    }
}
