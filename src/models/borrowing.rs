//! Borrowing (circulation record) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::fines;
use crate::models::policy::FinePolicy;

/// Circulation state of a borrowing. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum BorrowStatus {
    Borrowed = 0,
    Overdue = 1,
    Returned = 2,
}

impl BorrowStatus {
    /// Borrowed and overdue records still hold a copy of the book
    pub fn is_active(&self) -> bool {
        matches!(self, BorrowStatus::Borrowed | BorrowStatus::Overdue)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BorrowStatus::Returned)
    }
}

impl From<i16> for BorrowStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => BorrowStatus::Overdue,
            2 => BorrowStatus::Returned,
            _ => BorrowStatus::Borrowed,
        }
    }
}

impl From<BorrowStatus> for i16 {
    fn from(s: BorrowStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BorrowStatus::Borrowed => "borrowed",
            BorrowStatus::Overdue => "overdue",
            BorrowStatus::Returned => "returned",
        };
        write!(f, "{}", label)
    }
}

impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Ok(BorrowStatus::from(v))
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Monetary settlement state of a borrowing's fine. Independent of the
/// circulation state: a returned book can still carry an unpaid fine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum FineStatus {
    None = 0,
    Pending = 1,
    Partial = 2,
    Paid = 3,
    Waived = 4,
}

impl FineStatus {
    /// Settlement-state adjustment after a fine recomputation.
    ///
    /// Only the unsettled states move: a positive fine turns `none` into
    /// `pending`, and a zero fine clears back to `none` (a waiver is kept).
    /// Partial/paid/waived mirror the latest payment and are never
    /// overwritten by recomputation.
    pub fn reconcile(current: FineStatus, fine: Decimal) -> FineStatus {
        if fine.is_zero() {
            match current {
                FineStatus::Waived => FineStatus::Waived,
                _ => FineStatus::None,
            }
        } else {
            match current {
                FineStatus::None => FineStatus::Pending,
                other => other,
            }
        }
    }
}

impl From<i16> for FineStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => FineStatus::Pending,
            2 => FineStatus::Partial,
            3 => FineStatus::Paid,
            4 => FineStatus::Waived,
            _ => FineStatus::None,
        }
    }
}

impl From<FineStatus> for i16 {
    fn from(s: FineStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for FineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FineStatus::None => "none",
            FineStatus::Pending => "pending",
            FineStatus::Partial => "partial",
            FineStatus::Paid => "paid",
            FineStatus::Waived => "waived",
        };
        write!(f, "{}", label)
    }
}

impl sqlx::Type<Postgres> for FineStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for FineStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Ok(FineStatus::from(v))
    }
}

impl Encode<'_, Postgres> for FineStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Borrowing model from database.
///
/// While the record is active its `fine` is a derived value, refreshed on
/// every read via [`Borrowing::evaluate`]; the stored amount only becomes
/// authoritative once the book is returned.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine: Decimal,
    pub fine_status: FineStatus,
    pub status: BorrowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Field changes produced by a lazy status refresh
#[derive(Debug, Clone, PartialEq)]
pub struct BorrowingPatch {
    pub status: BorrowStatus,
    pub fine: Decimal,
    pub fine_status: FineStatus,
}

impl Borrowing {
    /// Lazy status refresh, applied whenever a borrowing is read.
    ///
    /// Promotes `borrowed` to `overdue` once the due date's calendar day has
    /// passed and recomputes the accrued fine under `policy`. Returns the
    /// changed fields, or None when the record is already current; repeated
    /// evaluation within the same calendar day is a no-op.
    pub fn evaluate(&self, now: DateTime<Utc>, policy: &FinePolicy) -> Option<BorrowingPatch> {
        if self.status.is_terminal() || self.return_date.is_some() {
            return None;
        }
        if fines::overdue_days(self.due_date, now) == 0 {
            return None;
        }

        let fine = fines::calculate_fine(self.due_date, now, policy);
        let patch = BorrowingPatch {
            status: BorrowStatus::Overdue,
            fine,
            fine_status: FineStatus::reconcile(self.fine_status, fine),
        };

        if patch.status == self.status
            && patch.fine == self.fine
            && patch.fine_status == self.fine_status
        {
            None
        } else {
            Some(patch)
        }
    }
}

/// Borrowing with book and member context for display
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub book_id: i32,
    pub book_title: String,
    pub user_id: i32,
    pub issue_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub fine: Decimal,
    pub fine_status: FineStatus,
    pub status: BorrowStatus,
    pub days_overdue: i64,
}

/// Service-level issue request
#[derive(Debug, Deserialize, ToSchema)]
pub struct IssueBorrowing {
    pub book_id: i32,
    pub user_id: i32,
    /// Due date override; defaults to issue date + configured loan period
    pub due_date: Option<DateTime<Utc>>,
    /// Claim the member's pending reservation on this book as part of the
    /// issue, converting its hold into the borrow
    #[serde(default)]
    pub fulfill_reservation: bool,
}

/// Outcome of a bulk overdue recalculation pass
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct RecalculationReport {
    /// Active borrowings scanned
    pub examined: u64,
    /// Borrowings whose status or fine actually changed
    pub updated: u64,
}
