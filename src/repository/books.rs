//! Books repository for database operations

use sqlx::{Pool, Postgres, Row, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book. All copies start available.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, copies_total, copies_available)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.isbn)
        .bind(book.copies_total)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let (books, total) = if let Some(ref title) = query.title {
            let pattern = format!("%{}%", title);
            let books = sqlx::query_as::<_, Book>(&format!(
                "SELECT * FROM books WHERE title ILIKE $1 ORDER BY title LIMIT {} OFFSET {}",
                per_page, offset
            ))
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE title ILIKE $1")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;
            (books, total)
        } else {
            let books = sqlx::query_as::<_, Book>(&format!(
                "SELECT * FROM books ORDER BY title LIMIT {} OFFSET {}",
                per_page, offset
            ))
            .fetch_all(&self.pool)
            .await?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
                .fetch_one(&self.pool)
                .await?;
            (books, total)
        };

        Ok((books, total))
    }

    /// Lock a book row for the duration of the transaction, serializing
    /// concurrent issue/reserve/return traffic on it. Returns
    /// `(copies_available, copies_total)`.
    pub async fn lock(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<(i16, i16)> {
        let row = sqlx::query(
            "SELECT copies_available, copies_total FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", book_id)))?;

        Ok((row.get("copies_available"), row.get("copies_total")))
    }

    /// Take one available copy of a book inside an open transaction.
    /// Fails when none are free; the count never goes negative.
    pub async fn take_copy(tx: &mut Transaction<'_, Postgres>, book_id: i32) -> AppResult<i16> {
        sqlx::query_scalar::<_, i16>(
            r#"
            UPDATE books
            SET copies_available = copies_available - 1, updated_at = NOW()
            WHERE id = $1 AND copies_available > 0
            RETURNING copies_available
            "#,
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::NoCopiesAvailable(format!("No copies of book {} are available", book_id))
        })
    }

    /// Put copies of a book back inside an open transaction. Fails if the
    /// count would exceed the total; the mismatch is never papered over.
    pub async fn put_copies(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        count: i16,
    ) -> AppResult<i16> {
        sqlx::query_scalar::<_, i16>(
            r#"
            UPDATE books
            SET copies_available = copies_available + $2, updated_at = NOW()
            WHERE id = $1 AND copies_available + $2 <= copies_total
            RETURNING copies_available
            "#,
        )
        .bind(book_id)
        .bind(count)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!(
                "Releasing {} copies of book {} would exceed its total",
                count, book_id
            ))
        })
    }
}
