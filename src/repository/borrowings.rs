//! Borrowings repository for database operations.
//!
//! Issue and return are multi-record updates (borrowing row plus the
//! book's availability), so they run as transactions serialized on the
//! book row lock. Overdue promotion is lazy: reads go through
//! [`BorrowingsRepository::get_refreshed`] or the list/recalculate
//! paths, which persist any status change they observe.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    fines,
    models::{
        borrowing::{
            BorrowStatus, Borrowing, BorrowingDetails, BorrowingPatch, FineStatus,
            IssueBorrowing, RecalculationReport,
        },
        policy::FinePolicy,
        reservation::ReservationStatus,
    },
    repository::{books::BooksRepository, reservations::ReservationsRepository},
};

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrowing by ID, as stored
    pub async fn get_by_id(&self, id: i32) -> AppResult<Borrowing> {
        sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))
    }

    /// Get borrowing by ID with the lazy overdue refresh applied and
    /// persisted
    pub async fn get_refreshed(&self, id: i32, policy: &FinePolicy) -> AppResult<Borrowing> {
        let borrowing = self.get_by_id(id).await?;
        let now = Utc::now();

        match borrowing.evaluate(now, policy) {
            Some(patch) => {
                let updated = sqlx::query_as::<_, Borrowing>(
                    r#"
                    UPDATE borrowings
                    SET status = $2, fine = $3, fine_status = $4, updated_at = NOW()
                    WHERE id = $1 AND return_date IS NULL
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(patch.status)
                .bind(patch.fine)
                .bind(patch.fine_status)
                .fetch_optional(&self.pool)
                .await?;

                // A concurrent return can slip in between the read and the
                // update; the guard makes this a lost race, not a corruption
                match updated {
                    Some(refreshed) => Ok(refreshed),
                    None => self.get_by_id(id).await,
                }
            }
            None => Ok(borrowing),
        }
    }

    /// Issue a book to a user.
    ///
    /// Runs as one transaction on the book's row lock: two concurrent
    /// issues against the last copy serialize there, and the loser fails
    /// with `NoCopiesAvailable`. When the request fulfills a pending
    /// reservation the hold's decrement carries over to the borrow, so
    /// availability is left untouched.
    pub async fn issue(
        &self,
        request: &IssueBorrowing,
        loan_period_days: i64,
    ) -> AppResult<Borrowing> {
        let now = Utc::now();
        let due_date = request
            .due_date
            .unwrap_or_else(|| now + Duration::days(loan_period_days));

        let mut tx = self.pool.begin().await?;

        BooksRepository::lock(&mut tx, request.book_id).await?;
        ReservationsRepository::release_expired(&mut tx, request.book_id, now).await?;

        let duplicate: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowings WHERE user_id = $1 AND book_id = $2 AND return_date IS NULL)",
        )
        .bind(request.user_id)
        .bind(request.book_id)
        .fetch_one(&mut *tx)
        .await?;

        if duplicate {
            return Err(AppError::DuplicateBorrow(format!(
                "User {} already holds book {}",
                request.user_id, request.book_id
            )));
        }

        if request.fulfill_reservation {
            let claimed = sqlx::query_scalar::<_, i32>(
                r#"
                UPDATE reservations
                SET status = $4
                WHERE id = (
                    SELECT id FROM reservations
                    WHERE user_id = $1 AND book_id = $2 AND status = $3
                    ORDER BY reservation_date
                    LIMIT 1
                    FOR UPDATE
                )
                RETURNING id
                "#,
            )
            .bind(request.user_id)
            .bind(request.book_id)
            .bind(ReservationStatus::Pending)
            .bind(ReservationStatus::Fulfilled)
            .fetch_optional(&mut *tx)
            .await?;

            match claimed {
                Some(reservation_id) => {
                    tracing::info!(
                        "Reservation {} fulfilled by issuing book {} to user {}",
                        reservation_id,
                        request.book_id,
                        request.user_id
                    );
                }
                None => {
                    return Err(AppError::NotFound(format!(
                        "No pending reservation for user {} on book {}",
                        request.user_id, request.book_id
                    )));
                }
            }
        } else {
            BooksRepository::take_copy(&mut tx, request.book_id).await?;
        }

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (book_id, user_id, issue_date, due_date, status, fine, fine_status)
            VALUES ($1, $2, $3, $4, $5, 0, $6)
            RETURNING *
            "#,
        )
        .bind(request.book_id)
        .bind(request.user_id)
        .bind(now)
        .bind(due_date)
        .bind(BorrowStatus::Borrowed)
        .bind(FineStatus::None)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Issued book {} to user {} as borrowing {}, due {}",
            request.book_id,
            request.user_id,
            borrowing.id,
            due_date
        );

        Ok(borrowing)
    }

    /// Return a borrowed book.
    ///
    /// Computes the final fine at the return date and stores it; from then
    /// on the stored amount is authoritative for payments. The borrowing
    /// row lock makes a second concurrent return fail with
    /// `AlreadyReturned` instead of double-incrementing availability.
    pub async fn return_book(
        &self,
        id: i32,
        return_date: Option<DateTime<Utc>>,
        policy: &FinePolicy,
    ) -> AppResult<Borrowing> {
        let returned_at = return_date.unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await?;

        let borrowing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Borrowing with id {} not found", id)))?;

        if borrowing.return_date.is_some() || borrowing.status.is_terminal() {
            return Err(AppError::AlreadyReturned(format!(
                "Borrowing {} is already returned",
                id
            )));
        }

        let fine = fines::calculate_fine(borrowing.due_date, returned_at, policy);
        let fine_status = FineStatus::reconcile(borrowing.fine_status, fine);

        let updated = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET status = $2, return_date = $3, fine = $4, fine_status = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BorrowStatus::Returned)
        .bind(returned_at)
        .bind(fine)
        .bind(fine_status)
        .fetch_one(&mut *tx)
        .await?;

        BooksRepository::put_copies(&mut tx, borrowing.book_id, 1).await?;

        tx.commit().await?;

        tracing::info!(
            "Borrowing {} returned, final fine {} ({})",
            id,
            updated.fine,
            updated.fine_status
        );

        Ok(updated)
    }

    /// Get a user's borrowings with book context, refreshed lazily
    pub async fn list_for_user(
        &self,
        user_id: i32,
        policy: &FinePolicy,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.*, bk.title AS book_title
            FROM borrowings b
            JOIN books bk ON b.book_id = bk.id
            WHERE b.user_id = $1
            ORDER BY b.issue_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let mut result = Vec::with_capacity(rows.len());

        for row in rows {
            let book_title: String = row.get("book_title");
            let mut borrowing = Borrowing::from_row(&row)?;

            if let Some(patch) = borrowing.evaluate(now, policy) {
                if self.apply_patch(borrowing.id, &patch).await? {
                    borrowing.status = patch.status;
                    borrowing.fine = patch.fine;
                    borrowing.fine_status = patch.fine_status;
                }
            }

            let reference = borrowing.return_date.unwrap_or(now);
            result.push(BorrowingDetails {
                id: borrowing.id,
                book_id: borrowing.book_id,
                book_title,
                user_id: borrowing.user_id,
                issue_date: borrowing.issue_date,
                due_date: borrowing.due_date,
                return_date: borrowing.return_date,
                fine: borrowing.fine,
                fine_status: borrowing.fine_status,
                status: borrowing.status,
                days_overdue: fines::overdue_days(borrowing.due_date, reference),
            });
        }

        Ok(result)
    }

    /// Re-evaluate every active borrowing against the current policy,
    /// persisting only actual changes. Safe to run repeatedly.
    pub async fn recalculate_all(&self, policy: &FinePolicy) -> AppResult<RecalculationReport> {
        let now = Utc::now();

        let active = sqlx::query_as::<_, Borrowing>(
            "SELECT * FROM borrowings WHERE return_date IS NULL AND status IN ($1, $2) ORDER BY id",
        )
        .bind(BorrowStatus::Borrowed)
        .bind(BorrowStatus::Overdue)
        .fetch_all(&self.pool)
        .await?;

        let examined = active.len() as u64;
        let mut updated = 0u64;

        for borrowing in &active {
            if let Some(patch) = borrowing.evaluate(now, policy) {
                if self.apply_patch(borrowing.id, &patch).await? {
                    updated += 1;
                }
            }
        }

        tracing::info!(
            "Fine recalculation examined {} active borrowings, updated {}",
            examined,
            updated
        );

        Ok(RecalculationReport { examined, updated })
    }

    /// Persist an evaluation patch. Guarded so a concurrent return wins:
    /// returns false when the row is no longer active.
    async fn apply_patch(&self, id: i32, patch: &BorrowingPatch) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE borrowings
            SET status = $2, fine = $3, fine_status = $4, updated_at = NOW()
            WHERE id = $1 AND return_date IS NULL
            "#,
        )
        .bind(id)
        .bind(patch.status)
        .bind(patch.fine)
        .bind(patch.fine_status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count borrowings still holding a copy
    pub async fn count_active(&self) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM borrowings WHERE return_date IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Count active borrowings past their due day, whether or not the lazy
    /// promotion has already been observed
    pub async fn count_overdue(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrowings WHERE return_date IS NULL AND due_date::date < NOW()::date",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of fines not yet fully settled
    pub async fn outstanding_fines(&self) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(fine), 0) FROM borrowings WHERE fine_status IN ($1, $2)",
        )
        .bind(FineStatus::Pending)
        .bind(FineStatus::Partial)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}
