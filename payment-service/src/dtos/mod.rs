//! Request and response shapes for the payment HTTP API.
//!
//! Inbound bodies bind to loosely-typed request structs (every field
//! optional) and are validated into the strongly-typed [`CreatePayment`] and
//! [`RefundPayment`] values the orchestrator accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::PaymentError;
use crate::models::{to_minor_units, Payment, PaymentStatus};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    #[validate(required(message = "orderId is required"))]
    pub order_id: Option<i64>,
    #[validate(required(message = "userId is required"))]
    pub user_id: Option<i64>,
    #[validate(
        required(message = "amount is required"),
        range(exclusive_min = 0.0, message = "amount must be greater than zero")
    )]
    pub amount: Option<f64>,
    #[validate(
        required(message = "method is required"),
        length(min = 1, message = "method cannot be empty")
    )]
    pub method: Option<String>,
}

/// A validated create-intent command.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatePayment {
    pub order_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub method: String,
}

impl TryFrom<CreatePaymentRequest> for CreatePayment {
    type Error = PaymentError;

    fn try_from(request: CreatePaymentRequest) -> Result<Self, Self::Error> {
        request
            .validate()
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        match request {
            CreatePaymentRequest {
                order_id: Some(order_id),
                user_id: Some(user_id),
                amount: Some(amount),
                method: Some(method),
            } => {
                to_minor_units(amount)?;
                Ok(CreatePayment {
                    order_id,
                    user_id,
                    amount,
                    method,
                })
            }
            _ => Err(PaymentError::Validation(
                "orderId, userId, amount and method are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefundPaymentRequest {
    #[validate(
        required(message = "amount is required"),
        range(exclusive_min = 0.0, message = "amount must be greater than zero")
    )]
    pub amount: Option<f64>,
    pub reason: Option<String>,
}

/// A validated refund command. Blank reasons are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RefundPayment {
    pub amount: f64,
    pub reason: Option<String>,
}

impl TryFrom<RefundPaymentRequest> for RefundPayment {
    type Error = PaymentError;

    fn try_from(request: RefundPaymentRequest) -> Result<Self, Self::Error> {
        request
            .validate()
            .map_err(|e| PaymentError::Validation(e.to_string()))?;

        let amount = request
            .amount
            .ok_or_else(|| PaymentError::Validation("amount is required".to_string()))?;
        to_minor_units(amount)?;
        let reason = request.reason.filter(|r| !r.trim().is_empty());

        Ok(RefundPayment { amount, reason })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: String,
    pub order_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub method: String,
    pub status: PaymentStatus,
    pub payment_intent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id.map(|id| id.to_hex()).unwrap_or_default(),
            order_id: p.order_id,
            user_id: p.user_id,
            amount: p.amount,
            method: p.method,
            status: p.status,
            payment_intent_id: p.payment_intent_id,
            transaction_id: p.transaction_id,
            refund_id: p.refund_id,
            created_at: p.created_at.to_chrono(),
            updated_at: p.updated_at.to_chrono(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    fn valid_request() -> CreatePaymentRequest {
        CreatePaymentRequest {
            order_id: Some(42),
            user_id: Some(7),
            amount: Some(19.99),
            method: Some("card".to_string()),
        }
    }

    #[test]
    fn valid_create_request_becomes_command() {
        let command = CreatePayment::try_from(valid_request()).unwrap();
        assert_eq!(
            command,
            CreatePayment {
                order_id: 42,
                user_id: 7,
                amount: 19.99,
                method: "card".to_string(),
            }
        );
    }

    #[test]
    fn missing_fields_are_rejected() {
        let request = CreatePaymentRequest {
            order_id: None,
            ..valid_request()
        };
        assert!(matches!(
            CreatePayment::try_from(request),
            Err(PaymentError::Validation(_))
        ));

        let request = CreatePaymentRequest {
            method: None,
            ..valid_request()
        };
        assert!(matches!(
            CreatePayment::try_from(request),
            Err(PaymentError::Validation(_))
        ));
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        for amount in [0.0, -5.0] {
            let request = CreatePaymentRequest {
                amount: Some(amount),
                ..valid_request()
            };
            assert!(matches!(
                CreatePayment::try_from(request),
                Err(PaymentError::Validation(_))
            ));
        }
    }

    #[test]
    fn amounts_outside_chargeable_range_are_rejected() {
        for amount in [0.001, 1e300] {
            let request = CreatePaymentRequest {
                amount: Some(amount),
                ..valid_request()
            };
            assert!(
                matches!(CreatePayment::try_from(request), Err(PaymentError::Validation(_))),
                "{} was accepted",
                amount
            );

            let refund = RefundPaymentRequest {
                amount: Some(amount),
                reason: None,
            };
            assert!(
                matches!(RefundPayment::try_from(refund), Err(PaymentError::Validation(_))),
                "refund of {} was accepted",
                amount
            );
        }
    }

    #[test]
    fn empty_method_is_rejected() {
        let request = CreatePaymentRequest {
            method: Some(String::new()),
            ..valid_request()
        };
        assert!(CreatePayment::try_from(request).is_err());
    }

    #[test]
    fn create_request_binds_camel_case_json() {
        let request: CreatePaymentRequest = serde_json::from_str(
            r#"{"orderId": 42, "userId": 7, "amount": 19.99, "method": "card"}"#,
        )
        .unwrap();
        assert!(CreatePayment::try_from(request).is_ok());
    }

    #[test]
    fn refund_requires_positive_amount_and_drops_blank_reason() {
        let refund = RefundPayment::try_from(RefundPaymentRequest {
            amount: Some(5.0),
            reason: Some("  ".to_string()),
        })
        .unwrap();
        assert_eq!(refund.reason, None);

        assert!(RefundPayment::try_from(RefundPaymentRequest::default()).is_err());
        assert!(RefundPayment::try_from(RefundPaymentRequest {
            amount: Some(0.0),
            reason: None,
        })
        .is_err());
    }

    #[test]
    fn response_renders_hex_id_and_copies_fields() {
        let id = ObjectId::new();
        let mut payment = Payment::pending(42, 7, 19.99, "card".to_string(), "pi_1".to_string());
        payment.id = Some(id);

        let response = PaymentResponse::from(payment.clone());
        assert_eq!(response.id, id.to_hex());
        assert_eq!(response.order_id, 42);
        assert_eq!(response.user_id, 7);
        assert_eq!(response.amount, 19.99);
        assert_eq!(response.method, "card");
        assert_eq!(response.status, PaymentStatus::Pending);
        assert_eq!(response.payment_intent_id, "pi_1");
        assert_eq!(response.created_at, payment.created_at.to_chrono());

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["paymentIntentId"], "pi_1");
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("refundId").is_none());
    }

    #[test]
    fn response_carries_gateway_references() {
        let mut payment = Payment::pending(42, 7, 19.99, "card".to_string(), "pi_1".to_string());
        payment.id = Some(ObjectId::new());
        payment.transaction_id = Some("pi_1".to_string());
        payment.refund_id = Some("re_1".to_string());

        let json = serde_json::to_value(PaymentResponse::from(payment)).unwrap();
        assert_eq!(json["transactionId"], "pi_1");
        assert_eq!(json["refundId"], "re_1");
    }
}
