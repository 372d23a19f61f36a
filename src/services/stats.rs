//! Statistics service

use crate::{api::stats::StatsResponse, error::AppResult, repository::Repository};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Circulation overview counts. Overdue is counted from due dates, so
    /// borrowings not yet lazily promoted are included.
    pub async fn overview(&self) -> AppResult<StatsResponse> {
        let active_borrowings = self.repository.borrowings.count_active().await?;
        let overdue_borrowings = self.repository.borrowings.count_overdue().await?;
        let pending_reservations = self.repository.reservations.count_pending().await?;
        let outstanding_fines = self.repository.borrowings.outstanding_fines().await?;

        Ok(StatsResponse {
            active_borrowings,
            overdue_borrowings,
            pending_reservations,
            outstanding_fines,
        })
    }
}
