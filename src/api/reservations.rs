//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, Reservation},
};

/// Place a hold on a book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = Reservation),
        (status = 404, description = "Book or user not found"),
        (status = 409, description = "No copies available or a pending reservation already exists")
    )
)]
pub async fn create_reservation(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<Reservation>)> {
    let reservation = state.services.reservations.reserve(request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Cancel a pending reservation
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation resolved", body = Reservation),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already resolved")
    )
)]
pub async fn cancel_reservation(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Reservation>> {
    let reservation = state.services.reservations.cancel(id).await?;
    Ok(Json(reservation))
}

/// Get reservations for a specific member
#[utoipa::path(
    get,
    path = "/users/{id}/reservations",
    tag = "reservations",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "The member's reservations", body = Vec<Reservation>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_reservations(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<Reservation>>> {
    let reservations = state.services.reservations.user_reservations(user_id).await?;
    Ok(Json(reservations))
}
