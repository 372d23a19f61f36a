//! Library member model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Library member from database. The circulation core only needs identity
/// and existence checks; account management lives outside this service.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create member request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}
