//! Payment endpoints under `/api/payments`.
//!
//! Each handler binds and validates its input, then hands off to
//! [`PaymentService`](crate::services::PaymentService).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        CreatePayment, CreatePaymentRequest, PaymentIntentResponse, PaymentResponse,
        RefundPayment, RefundPaymentRequest,
    },
    startup::AppState,
};

pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentIntentResponse>), AppError> {
    let input = CreatePayment::try_from(payload)?;

    tracing::info!(
        order_id = input.order_id,
        user_id = input.user_id,
        amount = input.amount,
        "Creating payment intent"
    );

    let intent = state.payments.create_payment_intent(input).await?;
    Ok((StatusCode::CREATED, Json(intent)))
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(payment_intent_id): Path<String>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state.payments.confirm_payment(&payment_intent_id).await?;
    Ok(Json(payment))
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<RefundPaymentRequest>,
) -> Result<Json<PaymentResponse>, AppError> {
    let input = RefundPayment::try_from(payload)?;
    let payment = state.payments.refund_payment(&id, input).await?;
    Ok(Json(payment))
}

pub async fn get_payment_by_order_id(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state.payments.get_payment_by_order_id(order_id).await?;
    Ok(Json(payment))
}

pub async fn get_payment_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, AppError> {
    let payment = state.payments.get_payment_by_id(&id).await?;
    Ok(Json(payment))
}

pub async fn get_payments_by_user_id(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PaymentResponse>>, AppError> {
    let payments = state.payments.get_payments_by_user_id(user_id).await?;
    Ok(Json(payments))
}
