//! Catalog service for book management

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book
    pub async fn create_book(&self, request: CreateBook) -> AppResult<Book> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.books.create(&request).await
    }

    /// Search books with pagination
    pub async fn search_books(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query).await
    }
}
