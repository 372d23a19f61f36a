//! Overdue fine calculation.
//!
//! Fines are never stored as permanent facts while a borrowing is active:
//! they are recomputed from `(due date, reference date, policy)` on every
//! read and transition, and only snapshotted when a payment is recorded or
//! the book is returned. The policy is always passed in by the caller so
//! the arithmetic here stays pure.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::policy::FinePolicy;

/// Number of whole calendar days the borrowing is overdue at `reference_date`.
///
/// An overdue day is a calendar day strictly after the due date, counted
/// through the reference day inclusive: a book returned the day after its
/// due date is 1 day overdue. Returns 0 on or before the due date.
pub fn overdue_days(due_date: DateTime<Utc>, reference_date: DateTime<Utc>) -> i64 {
    (reference_date.date_naive() - due_date.date_naive())
        .num_days()
        .max(0)
}

/// Compute the fine owed at `reference_date` under `policy`.
///
/// Grace days are excused before charging begins, the per-borrowing cap is
/// applied last, and the result is rounded to 2 decimal places only after
/// the cap comparison. Currency arithmetic stays in `Decimal` throughout.
pub fn calculate_fine(
    due_date: DateTime<Utc>,
    reference_date: DateTime<Utc>,
    policy: &FinePolicy,
) -> Decimal {
    let days = overdue_days(due_date, reference_date);
    let chargeable = (days - i64::from(policy.grace_period_days)).max(0);
    let raw = policy.rate_per_day * Decimal::from(chargeable);
    raw.min(policy.max_fine_per_book).round_dp(2)
}
