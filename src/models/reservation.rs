//! Reservation (pickup hold) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Reservation state. A pending reservation holds one available copy for
/// the member; cancelling, expiring, or fulfilling releases that hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ReservationStatus {
    Pending = 0,
    Fulfilled = 1,
    Cancelled = 2,
    Expired = 3,
}

impl ReservationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, ReservationStatus::Pending)
    }
}

impl From<i16> for ReservationStatus {
    fn from(v: i16) -> Self {
        match v {
            1 => ReservationStatus::Fulfilled,
            2 => ReservationStatus::Cancelled,
            3 => ReservationStatus::Expired,
            _ => ReservationStatus::Pending,
        }
    }
}

impl From<ReservationStatus> for i16 {
    fn from(s: ReservationStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Fulfilled => "fulfilled",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Expired => "expired",
        };
        write!(f, "{}", label)
    }
}

impl sqlx::Type<Postgres> for ReservationStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i16 as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for ReservationStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let v: i16 = Decode::<Postgres>::decode(value)?;
        Ok(ReservationStatus::from(v))
    }
}

impl Encode<'_, Postgres> for ReservationStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <i16 as Encode<Postgres>>::encode(*self as i16, buf)
    }
}

/// Reservation model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub id: i32,
    pub book_id: i32,
    pub user_id: i32,
    pub reservation_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Pending reservations auto-expire once their expiry timestamp passes;
    /// the transition is applied lazily when the record is read.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status.is_pending() && now > self.expiry_date
    }
}

/// Create reservation request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservation {
    pub book_id: i32,
    pub user_id: i32,
    /// Expiry override; defaults to now + configured hold period
    pub expiry_date: Option<DateTime<Utc>>,
}
