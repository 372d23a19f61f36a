//! Member account service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, User},
    repository::Repository,
};

#[derive(Clone)]
pub struct MembersService {
    repository: Repository,
}

impl MembersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a member by ID
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// Create a new member
    pub async fn create_user(&self, request: CreateUser) -> AppResult<User> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.users.create(&request).await
    }
}
