//! Fine policy repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::policy::{FinePolicy, UpdateFinePolicy},
};

#[derive(Clone)]
pub struct PoliciesRepository {
    pool: Pool<Postgres>,
}

impl PoliciesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get the currently active policy, the most recently created version.
    /// A seed row ships in the initial migration, so this only fails on a
    /// broken database.
    pub async fn latest(&self) -> AppResult<FinePolicy> {
        sqlx::query_as::<_, FinePolicy>(
            "SELECT * FROM fine_policies ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Internal("No fine policy configured".to_string()))
    }

    /// Insert a new policy version. Existing rows are never touched.
    pub async fn insert(&self, policy: &UpdateFinePolicy) -> AppResult<FinePolicy> {
        let created = sqlx::query_as::<_, FinePolicy>(
            r#"
            INSERT INTO fine_policies (rate_per_day, grace_period_days, max_fine_per_book, currency_code)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(policy.rate_per_day)
        .bind(policy.grace_period_days)
        .bind(policy.max_fine_per_book)
        .bind(&policy.currency_code)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
