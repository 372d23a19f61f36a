//! Data models for Athenaeum

pub mod book;
pub mod borrowing;
pub mod payment;
pub mod policy;
pub mod reservation;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookQuery, CreateBook};
pub use borrowing::{
    BorrowStatus, Borrowing, BorrowingDetails, BorrowingPatch, FineStatus, IssueBorrowing,
    RecalculationReport,
};
pub use payment::{
    FinePayment, PaymentMethod, PaymentSettlement, PaymentStatus, RecordPayment,
};
pub use policy::{FinePolicy, UpdateFinePolicy};
pub use reservation::{CreateReservation, Reservation, ReservationStatus};
pub use user::{CreateUser, User};
