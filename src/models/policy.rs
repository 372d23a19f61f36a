//! Fine policy model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Active fine policy. Policies are versioned: every settings save inserts
/// a new row and readers always resolve the most recently created one, so
/// existing rows are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FinePolicy {
    pub id: i32,
    /// Currency units charged per overdue day
    #[schema(value_type = String, example = "1.00")]
    pub rate_per_day: Decimal,
    /// Overdue days excused before charging begins
    pub grace_period_days: i16,
    /// Hard cap on any single borrowing's fine
    #[schema(value_type = String, example = "50.00")]
    pub max_fine_per_book: Decimal,
    pub currency_code: String,
    pub created_at: DateTime<Utc>,
}

/// Update fine policy request (saved as a new policy version)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFinePolicy {
    #[schema(value_type = String, example = "1.00")]
    pub rate_per_day: Decimal,
    #[validate(range(min = 0, message = "Grace period must not be negative"))]
    pub grace_period_days: i16,
    #[schema(value_type = String, example = "50.00")]
    pub max_fine_per_book: Decimal,
    #[validate(length(min = 3, max = 3, message = "Currency code must be 3 letters"))]
    pub currency_code: String,
}

impl UpdateFinePolicy {
    /// Range checks the `validator` derive cannot express for Decimal fields
    pub fn check_amounts(&self) -> Result<(), String> {
        if self.rate_per_day < Decimal::ZERO {
            return Err("Rate per day must not be negative".to_string());
        }
        if self.max_fine_per_book < Decimal::ZERO {
            return Err("Max fine per book must not be negative".to_string());
        }
        Ok(())
    }
}
