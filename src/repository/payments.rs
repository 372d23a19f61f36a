//! Fine payments repository for database operations.
//!
//! The ledger is append-only: every payment or waiver inserts a row
//! snapshotting the fine it settled against, and the owning borrowing's
//! `fine_status` is updated to mirror it in the same transaction.

use chrono::Utc;
use once_cell::sync::Lazy;
use snowflaked::sync::Generator;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrowing::{Borrowing, FineStatus},
        payment::{FinePayment, PaymentSettlement, RecordPayment},
        policy::FinePolicy,
    },
};

/// Process-wide receipt number source
static RECEIPTS: Lazy<Generator> = Lazy::new(|| Generator::new(0));

#[derive(Clone)]
pub struct PaymentsRepository {
    pool: Pool<Postgres>,
}

impl PaymentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a payment or waiver against a borrowing's fine.
    ///
    /// The fine is brought current first: recomputed at `now` for an
    /// active borrowing (and persisted if it moved), taken from the stored
    /// final amount for a returned one. A zero fine rejects with
    /// `NoFineDue`; amount and status rules live in
    /// [`PaymentSettlement::settle`].
    pub async fn record(
        &self,
        borrowing_id: i32,
        request: &RecordPayment,
        policy: &FinePolicy,
    ) -> AppResult<FinePayment> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let borrowing =
            sqlx::query_as::<_, Borrowing>("SELECT * FROM borrowings WHERE id = $1 FOR UPDATE")
                .bind(borrowing_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Borrowing with id {} not found", borrowing_id))
                })?;

        let fine = if borrowing.return_date.is_some() {
            borrowing.fine
        } else {
            match borrowing.evaluate(now, policy) {
                Some(patch) => {
                    sqlx::query(
                        r#"
                        UPDATE borrowings
                        SET status = $2, fine = $3, fine_status = $4, updated_at = NOW()
                        WHERE id = $1
                        "#,
                    )
                    .bind(borrowing_id)
                    .bind(patch.status)
                    .bind(patch.fine)
                    .bind(patch.fine_status)
                    .execute(&mut *tx)
                    .await?;
                    patch.fine
                }
                None => borrowing.fine,
            }
        };

        if fine.is_zero() {
            return Err(AppError::NoFineDue(format!(
                "Borrowing {} has no outstanding fine",
                borrowing_id
            )));
        }

        let settlement = PaymentSettlement::settle(request.method, request.amount_paid, fine)?;
        let receipt_number = format!("RCP-{}", RECEIPTS.generate::<u64>());

        let payment = sqlx::query_as::<_, FinePayment>(
            r#"
            INSERT INTO fine_payments
                (borrowing_id, user_id, processed_by, amount_paid, total_fine,
                 payment_method, payment_status, receipt_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(borrowing_id)
        .bind(borrowing.user_id)
        .bind(request.processed_by)
        .bind(settlement.amount_paid)
        .bind(fine)
        .bind(request.method)
        .bind(settlement.status)
        .bind(&receipt_number)
        .bind(&request.notes)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE borrowings SET fine_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(borrowing_id)
            .bind(FineStatus::from(settlement.status))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Payment {} on borrowing {}: {} of {} ({}), receipt {}",
            payment.id,
            borrowing_id,
            payment.amount_paid,
            payment.total_fine,
            payment.payment_status,
            payment.receipt_number
        );

        Ok(payment)
    }

    /// List payments recorded against a borrowing, oldest first
    pub async fn list_for_borrowing(&self, borrowing_id: i32) -> AppResult<Vec<FinePayment>> {
        let payments = sqlx::query_as::<_, FinePayment>(
            "SELECT * FROM fine_payments WHERE borrowing_id = $1 ORDER BY created_at, id",
        )
        .bind(borrowing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }
}
