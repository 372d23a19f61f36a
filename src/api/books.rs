//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, CreateBook},
};

/// Paginated book list
#[derive(Serialize, ToSchema)]
pub struct BookListResponse {
    pub items: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Search books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books matching the query", body = BookListResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookListResponse>> {
    let (items, total) = state.services.catalog.search_books(&query).await?;

    Ok(Json(BookListResponse {
        items,
        total,
        page: query.page.unwrap_or(1).max(1),
        per_page: query.per_page.unwrap_or(20).clamp(1, 100),
    }))
}

/// Get a book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book data")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}
