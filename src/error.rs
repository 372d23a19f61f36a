//! Error types for Athenaeum server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes reported in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NoSuchUser = 3,
    NoSuchBook = 4,
    NoSuchBorrowing = 5,
    NoSuchReservation = 6,
    NoCopiesAvailable = 7,
    DuplicateBorrow = 8,
    DuplicateReservation = 9,
    AlreadyReturned = 10,
    NoFineDue = 11,
    InvalidAmount = 12,
    BadValue = 13,
    Conflict = 14,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No copies available: {0}")]
    NoCopiesAvailable(String),

    #[error("Duplicate borrow: {0}")]
    DuplicateBorrow(String),

    #[error("Duplicate reservation: {0}")]
    DuplicateReservation(String),

    #[error("Already returned: {0}")]
    AlreadyReturned(String),

    #[error("No fine due: {0}")]
    NoFineDue(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, msg.clone())
            }
            AppError::NoCopiesAvailable(msg) => {
                (StatusCode::CONFLICT, ErrorCode::NoCopiesAvailable, msg.clone())
            }
            AppError::DuplicateBorrow(msg) => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateBorrow, msg.clone())
            }
            AppError::DuplicateReservation(msg) => {
                (StatusCode::CONFLICT, ErrorCode::DuplicateReservation, msg.clone())
            }
            AppError::AlreadyReturned(msg) => {
                (StatusCode::CONFLICT, ErrorCode::AlreadyReturned, msg.clone())
            }
            AppError::NoFineDue(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::NoFineDue, msg.clone())
            }
            AppError::InvalidAmount(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidAmount, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Conflict, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
