//! Fine payment endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::payment::{FinePayment, RecordPayment},
};

/// Record a payment or waiver against a borrowing's fine
#[utoipa::path(
    post,
    path = "/borrowings/{id}/payments",
    tag = "payments",
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    request_body = RecordPayment,
    responses(
        (status = 201, description = "Payment recorded", body = FinePayment),
        (status = 400, description = "Invalid payment amount"),
        (status = 404, description = "Borrowing or staff member not found"),
        (status = 422, description = "No fine due on this borrowing")
    )
)]
pub async fn record_payment(
    State(state): State<crate::AppState>,
    Path(borrowing_id): Path<i32>,
    Json(request): Json<RecordPayment>,
) -> AppResult<(StatusCode, Json<FinePayment>)> {
    let payment = state
        .services
        .payments
        .record_payment(borrowing_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// List the payment ledger for a borrowing
#[utoipa::path(
    get,
    path = "/borrowings/{id}/payments",
    tag = "payments",
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Payments recorded against the borrowing", body = Vec<FinePayment>),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn list_payments(
    State(state): State<crate::AppState>,
    Path(borrowing_id): Path<i32>,
) -> AppResult<Json<Vec<FinePayment>>> {
    let payments = state.services.payments.borrowing_payments(borrowing_id).await?;
    Ok(Json(payments))
}
