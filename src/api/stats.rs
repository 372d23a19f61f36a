//! Statistics endpoints

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

/// Circulation overview counts
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Borrowings still holding a copy
    pub active_borrowings: i64,
    /// Active borrowings past their due day
    pub overdue_borrowings: i64,
    /// Reservations currently holding a copy
    pub pending_reservations: i64,
    /// Sum of fines not yet fully settled
    #[schema(value_type = String, example = "123.50")]
    pub outstanding_fines: Decimal,
}

/// Get circulation statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Circulation overview", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<crate::AppState>) -> AppResult<Json<StatsResponse>> {
    let stats = state.services.stats.overview().await?;
    Ok(Json(stats))
}
