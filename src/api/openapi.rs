//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrowings, health, payments, reservations, settings, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Athenaeum API",
        version = "1.0.0",
        description = "Library circulation REST API: borrowing lifecycle, overdue fines, reservations and payments",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        // Users
        users::get_user,
        users::create_user,
        // Borrowings
        borrowings::issue_borrowing,
        borrowings::get_borrowing,
        borrowings::return_borrowing,
        borrowings::recalculate_fines,
        borrowings::get_user_borrowings,
        // Payments
        payments::record_payment,
        payments::list_payments,
        // Reservations
        reservations::create_reservation,
        reservations::cancel_reservation,
        reservations::get_user_reservations,
        // Settings
        settings::get_fine_policy,
        settings::update_fine_policy,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            books::BookListResponse,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            // Borrowings
            crate::models::borrowing::Borrowing,
            crate::models::borrowing::BorrowingDetails,
            crate::models::borrowing::BorrowStatus,
            crate::models::borrowing::FineStatus,
            crate::models::borrowing::IssueBorrowing,
            crate::models::borrowing::RecalculationReport,
            borrowings::IssueResponse,
            borrowings::ReturnRequest,
            borrowings::ReturnResponse,
            // Payments
            crate::models::payment::FinePayment,
            crate::models::payment::PaymentMethod,
            crate::models::payment::PaymentStatus,
            crate::models::payment::RecordPayment,
            // Reservations
            crate::models::reservation::Reservation,
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::CreateReservation,
            // Policy
            crate::models::policy::FinePolicy,
            crate::models::policy::UpdateFinePolicy,
            // Stats
            stats::StatsResponse,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "users", description = "Member accounts"),
        (name = "borrowings", description = "Borrowing lifecycle and fines"),
        (name = "payments", description = "Fine payment ledger"),
        (name = "reservations", description = "Reservation holds"),
        (name = "settings", description = "Fine policy settings"),
        (name = "stats", description = "Circulation statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
