//! Fine policy service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::policy::{FinePolicy, UpdateFinePolicy},
    repository::Repository,
};

#[derive(Clone)]
pub struct PoliciesService {
    repository: Repository,
}

impl PoliciesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get the currently active fine policy
    pub async fn current(&self) -> AppResult<FinePolicy> {
        self.repository.policies.latest().await
    }

    /// Save a new policy version. Fines computed from now on use it,
    /// including for borrowings that went overdue under the old one.
    pub async fn update(&self, request: UpdateFinePolicy) -> AppResult<FinePolicy> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        request.check_amounts().map_err(AppError::Validation)?;

        let policy = self.repository.policies.insert(&request).await?;
        tracing::info!(
            "Fine policy updated: {} {}/day, grace {} days, cap {}",
            policy.currency_code,
            policy.rate_per_day,
            policy.grace_period_days,
            policy.max_fine_per_book
        );
        Ok(policy)
    }
}
