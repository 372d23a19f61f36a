//! Borrowing lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrowing::{Borrowing, BorrowingDetails, IssueBorrowing, RecalculationReport},
};

/// Issue response
#[derive(Serialize, ToSchema)]
pub struct IssueResponse {
    pub borrowing: Borrowing,
    pub message: String,
}

/// Return request body, optional
#[derive(Deserialize, ToSchema)]
pub struct ReturnRequest {
    /// Return date override; defaults to now
    pub return_date: Option<DateTime<Utc>>,
}

/// Return response with the settled borrowing
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub borrowing: Borrowing,
}

/// Issue a book to a member
#[utoipa::path(
    post,
    path = "/borrowings",
    tag = "borrowings",
    request_body = IssueBorrowing,
    responses(
        (status = 201, description = "Book issued", body = IssueResponse),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies available or user already holds this book")
    )
)]
pub async fn issue_borrowing(
    State(state): State<crate::AppState>,
    Json(request): Json<IssueBorrowing>,
) -> AppResult<(StatusCode, Json<IssueResponse>)> {
    let borrowing = state.services.circulation.issue(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            message: format!("Book issued, due {}", borrowing.due_date.date_naive()),
            borrowing,
        }),
    ))
}

/// Get a borrowing, with overdue status and fine brought current
#[utoipa::path(
    get,
    path = "/borrowings/{id}",
    tag = "borrowings",
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "The borrowing", body = Borrowing),
        (status = 404, description = "Borrowing not found")
    )
)]
pub async fn get_borrowing(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Borrowing>> {
    let borrowing = state.services.circulation.get_borrowing(id).await?;
    Ok(Json(borrowing))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowings",
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrowing(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    body: Option<Json<ReturnRequest>>,
) -> AppResult<Json<ReturnResponse>> {
    let return_date = body.and_then(|Json(request)| request.return_date);
    let borrowing = state.services.circulation.return_book(id, return_date).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrowing,
    }))
}

/// Re-evaluate overdue status and fines for all active borrowings
#[utoipa::path(
    post,
    path = "/borrowings/recalculate",
    tag = "borrowings",
    responses(
        (status = 200, description = "Recalculation finished", body = RecalculationReport)
    )
)]
pub async fn recalculate_fines(
    State(state): State<crate::AppState>,
) -> AppResult<Json<RecalculationReport>> {
    let report = state.services.circulation.recalculate_fines().await?;
    Ok(Json(report))
}

/// Get borrowings for a specific member
#[utoipa::path(
    get,
    path = "/users/{id}/borrowings",
    tag = "borrowings",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "The member's borrowings", body = Vec<BorrowingDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_borrowings(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    let borrowings = state.services.circulation.user_borrowings(user_id).await?;
    Ok(Json(borrowings))
}
