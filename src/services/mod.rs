//! Business logic services

pub mod catalog;
pub mod circulation;
pub mod members;
pub mod payments;
pub mod policies;
pub mod reservations;
pub mod stats;

use crate::{config::CirculationConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub members: members::MembersService,
    pub circulation: circulation::CirculationService,
    pub reservations: reservations::ReservationsService,
    pub payments: payments::PaymentsService,
    pub policies: policies::PoliciesService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, circulation_config: CirculationConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            members: members::MembersService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                circulation_config.clone(),
            ),
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                circulation_config,
            ),
            payments: payments::PaymentsService::new(repository.clone()),
            policies: policies::PoliciesService::new(repository.clone()),
            stats: stats::StatsService::new(repository),
        }
    }
}
