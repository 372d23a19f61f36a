//! Reservation service

use crate::{
    config::CirculationConfig,
    error::AppResult,
    models::reservation::{CreateReservation, Reservation},
    repository::Repository,
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    config: CirculationConfig,
}

impl ReservationsService {
    pub fn new(repository: Repository, config: CirculationConfig) -> Self {
        Self { repository, config }
    }

    /// Place a hold on a book for a member
    pub async fn reserve(&self, request: CreateReservation) -> AppResult<Reservation> {
        self.repository.users.get_by_id(request.user_id).await?;
        self.repository.books.get_by_id(request.book_id).await?;
        self.repository
            .reservations
            .create(&request, self.config.reservation_hold_days)
            .await
    }

    /// Cancel a pending reservation
    pub async fn cancel(&self, id: i32) -> AppResult<Reservation> {
        self.repository.reservations.cancel(id).await
    }

    /// List a member's reservations with lazy expiry applied
    pub async fn user_reservations(&self, user_id: i32) -> AppResult<Vec<Reservation>> {
        self.repository.users.get_by_id(user_id).await?;
        self.repository.reservations.list_for_user(user_id).await
    }
}
