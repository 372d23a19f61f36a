//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database.
///
/// `copies_available` is reconciled incrementally: every borrowing or
/// reservation event applies exactly one matching increment or decrement,
/// so at all times it equals `copies_total` minus active borrowings minus
/// pending reservations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub copies_total: i16,
    pub copies_available: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    #[validate(range(min = 0, message = "Copy count must not be negative"))]
    pub copies_total: i16,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
