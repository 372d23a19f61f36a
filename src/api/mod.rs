//! API handlers for Athenaeum REST endpoints

pub mod books;
pub mod borrowings;
pub mod health;
pub mod openapi;
pub mod payments;
pub mod reservations;
pub mod settings;
pub mod stats;
pub mod users;
