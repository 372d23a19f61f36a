//! Fine payment model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::borrowing::FineStatus;

/// How a fine was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum PaymentMethod {
    Cash = 0,
    Card = 1,
    Online = 2,
    Waived = 3,
}

impl PaymentMethod {
    pub fn is_waiver(&self) -> bool {
        matches!(self, PaymentMethod::Waived)
    }
}

impl From<i16> for PaymentMethod {
    fn from(v: i16) -> Self {
        match v {
            1 => PaymentMethod::Card,
            2 => PaymentMethod::Online,
            3 => PaymentMethod::Waived,
            _ => PaymentMethod::Cash,
        }
    }
}

impl From<PaymentMethod> for i16 {
    fn from(m: PaymentMethod) -> Self {
        m as i16
    }
}

impl sqlx::Type<Postgres> for PaymentMethod {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for PaymentMethod {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Ok(PaymentMethod::from(v))
    }
}

impl Encode<'_, Postgres> for PaymentMethod {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Settlement outcome of a single payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum PaymentStatus {
    Pending = 0,
    Partial = 1,
    Paid = 2,
    Waived = 3,
}

impl PaymentStatus {
    /// Derive the status of a non-waiver payment from its amounts
    pub fn derive(amount_paid: Decimal, total_fine: Decimal) -> PaymentStatus {
        if amount_paid >= total_fine {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        }
    }
}

impl From<i16> for PaymentStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => PaymentStatus::Partial,
            2 => PaymentStatus::Paid,
            3 => PaymentStatus::Waived,
            _ => PaymentStatus::Pending,
        }
    }
}

impl From<PaymentStatus> for i16 {
    fn from(s: PaymentStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Waived => "waived",
        };
        write!(f, "{}", label)
    }
}

/// The owning borrowing's `fine_status` mirrors the latest payment's status
impl From<PaymentStatus> for FineStatus {
    fn from(s: PaymentStatus) -> Self {
        match s {
            PaymentStatus::Pending => FineStatus::Pending,
            PaymentStatus::Partial => FineStatus::Partial,
            PaymentStatus::Paid => FineStatus::Paid,
            PaymentStatus::Waived => FineStatus::Waived,
        }
    }
}

impl sqlx::Type<Postgres> for PaymentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for PaymentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Ok(PaymentStatus::from(v))
    }
}

impl Encode<'_, Postgres> for PaymentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Fine payment record from database. Append-only: each partial payment
/// or waiver produces its own row, with `total_fine` snapshotting the
/// recomputed fine at payment time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FinePayment {
    pub id: i32,
    pub borrowing_id: i32,
    pub user_id: i32,
    /// Staff member who processed the transaction
    pub processed_by: i32,
    pub amount_paid: Decimal,
    pub total_fine: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub receipt_number: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service-level payment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPayment {
    pub amount_paid: Decimal,
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub processed_by: i32,
}

/// Resolved amount and status for a payment request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSettlement {
    pub amount_paid: Decimal,
    pub status: PaymentStatus,
}

impl PaymentSettlement {
    /// Apply the settlement rules against the recomputed fine.
    ///
    /// A waiver always settles the whole fine. Other methods require a
    /// positive amount, clamp overpayment to the fine (excess is not
    /// tracked as credit), and derive paid/partial from the clamped
    /// amount, so `amount_paid <= total_fine` always holds on the record.
    pub fn settle(
        method: PaymentMethod,
        amount_paid: Decimal,
        fine: Decimal,
    ) -> AppResult<PaymentSettlement> {
        if method.is_waiver() {
            return Ok(PaymentSettlement {
                amount_paid: fine,
                status: PaymentStatus::Waived,
            });
        }

        if amount_paid <= Decimal::ZERO {
            return Err(AppError::InvalidAmount(
                "Payment amount must be positive".to_string(),
            ));
        }

        let clamped = amount_paid.min(fine);
        Ok(PaymentSettlement {
            amount_paid: clamped,
            status: PaymentStatus::derive(clamped, fine),
        })
    }
}
