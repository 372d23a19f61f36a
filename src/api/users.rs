//! Member account endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::user::{CreateUser, User},
};

/// Get a member
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "The member", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    let user = state.services.members.get_user(id).await?;
    Ok(Json(user))
}

/// Register a member
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "Member created", body = User),
        (status = 400, description = "Invalid member data")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.members.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
