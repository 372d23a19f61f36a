//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Check that a user exists without loading the row
    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// Create a new user
    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (firstname, lastname, email)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
