use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// A payment record as stored in the `payments` collection.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub order_id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub method: String,
    pub status: PaymentStatus,
    pub payment_intent_id: String,
    /// Gateway reference recorded when the payment completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Gateway refund id recorded when the payment is refunded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Payment {
    /// A fresh `PENDING` payment bound to a gateway intent. The id is assigned
    /// by the store on insert.
    pub fn pending(
        order_id: i64,
        user_id: i64,
        amount: f64,
        method: String,
        payment_intent_id: String,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            order_id,
            user_id,
            amount,
            method,
            status: PaymentStatus::Pending,
            payment_intent_id,
            transaction_id: None,
            refund_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lifecycle of a payment. `Failed` is part of the stored vocabulary but no
/// operation currently assigns it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Completed => write!(f, "COMPLETED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Selector for the atomic status update.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFilter {
    Id(ObjectId),
    PaymentIntentId(String),
}

/// Target of an atomic status update, with the gateway reference that
/// caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub refund_id: Option<String>,
}

impl StatusChange {
    pub fn completed(transaction_id: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Completed,
            transaction_id: Some(transaction_id.into()),
            refund_id: None,
        }
    }

    pub fn refunded(refund_id: impl Into<String>) -> Self {
        Self {
            status: PaymentStatus::Refunded,
            transaction_id: None,
            refund_id: Some(refund_id.into()),
        }
    }

    /// Apply the change to an in-memory copy, refreshing `updated_at`.
    pub fn apply(&self, payment: &mut Payment) {
        payment.status = self.status;
        if let Some(transaction_id) = &self.transaction_id {
            payment.transaction_id = Some(transaction_id.clone());
        }
        if let Some(refund_id) = &self.refund_id {
            payment.refund_id = Some(refund_id.clone());
        }
        payment.updated_at = DateTime::now();
    }
}

/// Parse a store identifier, rejecting anything that is not a 24-char hex
/// ObjectId.
pub fn parse_payment_id(id: &str) -> Result<ObjectId, PaymentError> {
    ObjectId::parse_str(id)
        .map_err(|_| PaymentError::InvalidIdentifier(format!("invalid payment id: {}", id)))
}

/// Convert a major-unit amount to the gateway's minor units (cents).
///
/// Fails unless the rounded result is at least one cent and fits in an
/// `i64`.
pub fn to_minor_units(amount: f64) -> Result<i64, PaymentError> {
    let minor = (amount * 100.0).round();
    if !minor.is_finite() || minor >= i64::MAX as f64 {
        return Err(PaymentError::Validation(format!(
            "amount {} is too large to charge",
            amount
        )));
    }
    if minor < 1.0 {
        return Err(PaymentError::Validation(format!(
            "amount {} is less than the smallest chargeable unit (0.01)",
            amount
        )));
    }
    Ok(minor as i64)
}
