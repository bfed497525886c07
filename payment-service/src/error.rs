//! Domain errors for the payment orchestrator and its collaborators.

use service_core::error::AppError;
use thiserror::Error;

use crate::services::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(String),
}

impl From<mongodb::error::Error> for PaymentError {
    fn from(err: mongodb::error::Error) -> Self {
        PaymentError::Store(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for PaymentError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        PaymentError::Store(err.to_string())
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            PaymentError::InvalidIdentifier(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            PaymentError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            PaymentError::Gateway(e) => AppError::BadGateway(e.to_string()),
            PaymentError::Store(msg) => AppError::DatabaseError(anyhow::anyhow!(msg)),
        }
    }
}
