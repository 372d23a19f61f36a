//! Fine payment service

use crate::{
    error::AppResult,
    models::payment::{FinePayment, RecordPayment},
    repository::Repository,
};

#[derive(Clone)]
pub struct PaymentsService {
    repository: Repository,
}

impl PaymentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Record a payment or waiver against a borrowing's fine
    pub async fn record_payment(
        &self,
        borrowing_id: i32,
        request: RecordPayment,
    ) -> AppResult<FinePayment> {
        // The processing staff member must exist; the borrowing itself is
        // checked under lock inside the transaction
        self.repository.users.get_by_id(request.processed_by).await?;
        let policy = self.repository.policies.latest().await?;
        self.repository
            .payments
            .record(borrowing_id, &request, &policy)
            .await
    }

    /// List the payment ledger for a borrowing
    pub async fn borrowing_payments(&self, borrowing_id: i32) -> AppResult<Vec<FinePayment>> {
        self.repository.borrowings.get_by_id(borrowing_id).await?;
        self.repository.payments.list_for_borrowing(borrowing_id).await
    }
}
