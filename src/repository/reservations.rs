//! Reservations repository for database operations.
//!
//! A pending reservation holds one available copy. Expiry is never
//! driven by a timer: any path reading reservation state first releases
//! the holds whose expiry has passed, under the same book row lock the
//! issue/reserve paths use.

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::reservation::{CreateReservation, Reservation, ReservationStatus},
    repository::books::BooksRepository,
};

#[derive(Clone)]
pub struct ReservationsRepository {
    pool: Pool<Postgres>,
}

impl ReservationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get reservation by ID, as stored
    pub async fn get_by_id(&self, id: i32) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Reservation with id {} not found", id)))
    }

    /// Expire a book's stale pending reservations and release their holds.
    /// The caller must already hold the book's row lock.
    pub async fn release_expired(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<i64> {
        let expired = sqlx::query_scalar::<_, i64>(
            r#"
            WITH stale AS (
                UPDATE reservations
                SET status = $3
                WHERE book_id = $1 AND status = $2 AND expiry_date < $4
                RETURNING id
            )
            SELECT COUNT(*) FROM stale
            "#,
        )
        .bind(book_id)
        .bind(ReservationStatus::Pending)
        .bind(ReservationStatus::Expired)
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;

        if expired > 0 {
            BooksRepository::put_copies(tx, book_id, expired as i16).await?;
            tracing::info!("Expired {} stale reservations on book {}", expired, book_id);
        }

        Ok(expired)
    }

    /// Place a hold on an available copy.
    ///
    /// Serialized on the book row lock like issue, so a reserve racing an
    /// issue for the last copy cannot drive availability negative. One
    /// pending reservation per user and book; a partial unique index backs
    /// the check.
    pub async fn create(
        &self,
        request: &CreateReservation,
        hold_days: i64,
    ) -> AppResult<Reservation> {
        let now = Utc::now();
        let expiry_date = request
            .expiry_date
            .unwrap_or_else(|| now + Duration::days(hold_days));

        let mut tx = self.pool.begin().await?;

        BooksRepository::lock(&mut tx, request.book_id).await?;
        Self::release_expired(&mut tx, request.book_id, now).await?;

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM reservations WHERE user_id = $1 AND book_id = $2 AND status = $3)",
        )
        .bind(request.user_id)
        .bind(request.book_id)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateReservation(format!(
                "User {} already has a pending reservation on book {}",
                request.user_id, request.book_id
            )));
        }

        BooksRepository::take_copy(&mut tx, request.book_id).await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (book_id, user_id, reservation_date, expiry_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.book_id)
        .bind(request.user_id)
        .bind(now)
        .bind(expiry_date)
        .bind(ReservationStatus::Pending)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Reserved book {} for user {} until {}",
            request.book_id,
            request.user_id,
            expiry_date
        );

        Ok(reservation)
    }

    /// Cancel a pending reservation and release its hold.
    ///
    /// A reservation whose expiry already passed transitions to `expired`
    /// instead of `cancelled`; either way the hold is released exactly
    /// once. Terminal reservations fail with `Conflict`.
    pub async fn cancel(&self, id: i32) -> AppResult<Reservation> {
        let now = Utc::now();

        // Read first to learn the book, then lock book before reservation,
        // same order as the issue path
        let reservation = self.get_by_id(id).await?;

        let mut tx = self.pool.begin().await?;

        BooksRepository::lock(&mut tx, reservation.book_id).await?;

        let locked =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Reservation with id {} not found", id))
                })?;

        if !locked.status.is_pending() {
            return Err(AppError::Conflict(format!(
                "Reservation {} is already {}",
                id, locked.status
            )));
        }

        let new_status = if locked.is_expired(now) {
            ReservationStatus::Expired
        } else {
            ReservationStatus::Cancelled
        };

        let updated = sqlx::query_as::<_, Reservation>(
            "UPDATE reservations SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(new_status)
        .fetch_one(&mut *tx)
        .await?;

        BooksRepository::put_copies(&mut tx, reservation.book_id, 1).await?;

        tx.commit().await?;

        tracing::info!("Reservation {} resolved as {}", id, updated.status);

        Ok(updated)
    }

    /// Get a user's reservations, applying lazy expiry first
    pub async fn list_for_user(&self, user_id: i32) -> AppResult<Vec<Reservation>> {
        let now = Utc::now();

        // Ascending book order keeps concurrent sweeps lock-compatible
        let stale_books: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT book_id FROM reservations
            WHERE user_id = $1 AND status = $2 AND expiry_date < $3
            ORDER BY book_id
            "#,
        )
        .bind(user_id)
        .bind(ReservationStatus::Pending)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        if !stale_books.is_empty() {
            let mut tx = self.pool.begin().await?;
            for book_id in stale_books {
                BooksRepository::lock(&mut tx, book_id).await?;
                Self::release_expired(&mut tx, book_id, now).await?;
            }
            tx.commit().await?;
        }

        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = $1 ORDER BY reservation_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    /// Count holds currently taken out of availability
    pub async fn count_pending(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reservations WHERE status = $1")
                .bind(ReservationStatus::Pending)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
