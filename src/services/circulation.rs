//! Circulation service: issue, lazy status refresh, return, bulk
//! recalculation. The current fine policy is resolved here and passed
//! down, so the calculation layer never reads ambient state.

use chrono::{DateTime, Utc};

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::borrowing::{Borrowing, BorrowingDetails, IssueBorrowing, RecalculationReport},
    repository::Repository,
};

#[derive(Clone)]
pub struct CirculationService {
    repository: Repository,
    config: CirculationConfig,
}

impl CirculationService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Issue a book to a member
    pub async fn issue(&self, request: IssueBorrowing) -> AppResult<Borrowing> {
        // Verify both ends of the reference exist before touching state
        self.repository.users.get_by_id(request.user_id).await?;
        self.repository.books.get_by_id(request.book_id).await?;
        self.repository
            .borrowings
            .issue(&request, self.config.loan_period_days)
            .await
    }

    /// Get a borrowing with its status brought current
    pub async fn get_borrowing(&self, id: i32) -> AppResult<Borrowing> {
        let policy = self.repository.policies.latest().await?;
        self.repository.borrowings.get_refreshed(id, &policy).await
    }

    /// Return a borrowed book
    pub async fn return_book(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
    ) -> AppResult<Borrowing> {
        let policy = self.repository.policies.latest().await?;
        self.repository
            .borrowings
            .return_book(id, return_date, &policy)
            .await
    }

    /// List a member's borrowings, refreshed
    pub async fn user_borrowings(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.users.get_by_id(user_id).await?;
        let policy = self.repository.policies.latest().await?;
        self.repository
            .borrowings
            .list_for_user(user_id, &policy)
            .await
    }

    /// Re-evaluate all active borrowings against the current policy
    pub async fn recalculate_fines(&self) -> AppResult<RecalculationReport> {
        let policy = self.repository.policies.latest().await?;
        self.repository.borrowings.recalculate_all(&policy).await
    }
}
