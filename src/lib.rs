//! Athenaeum Library Circulation Server
//!
//! A REST JSON API for library circulation: issuing and returning books,
//! overdue fine calculation under a versioned policy, reservation holds,
//! and the fine payment ledger.

use sqlx::{Pool, Postgres};
use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod fines;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Kept alongside the services for infrastructure probes
    pub pool: Pool<Postgres>,
}
