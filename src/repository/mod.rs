//! Repository layer for database operations

pub mod books;
pub mod borrowings;
pub mod payments;
pub mod policies;
pub mod reservations;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub reservations: reservations::ReservationsRepository,
    pub payments: payments::PaymentsRepository,
    pub policies: policies::PoliciesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            payments: payments::PaymentsRepository::new(pool.clone()),
            policies: policies::PoliciesRepository::new(pool.clone()),
            pool,
        }
    }
}
