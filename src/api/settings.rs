//! Fine policy settings endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::policy::{FinePolicy, UpdateFinePolicy},
};

/// Get the active fine policy
#[utoipa::path(
    get,
    path = "/settings/fine-policy",
    tag = "settings",
    responses(
        (status = 200, description = "The currently active policy", body = FinePolicy)
    )
)]
pub async fn get_fine_policy(
    State(state): State<crate::AppState>,
) -> AppResult<Json<FinePolicy>> {
    let policy = state.services.policies.current().await?;
    Ok(Json(policy))
}

/// Save a new fine policy version
#[utoipa::path(
    put,
    path = "/settings/fine-policy",
    tag = "settings",
    request_body = UpdateFinePolicy,
    responses(
        (status = 200, description = "New policy version saved", body = FinePolicy),
        (status = 400, description = "Invalid policy values")
    )
)]
pub async fn update_fine_policy(
    State(state): State<crate::AppState>,
    Json(request): Json<UpdateFinePolicy>,
) -> AppResult<Json<FinePolicy>> {
    let policy = state.services.policies.update(request).await?;
    Ok(Json(policy))
}
