//! Migration triggers: when to re-run a migration decision.

use mec_core::ServiceId;
use mec_resource::{CloudNetwork, Population};

use crate::PlacementResult;

/// Per-step condition for re-evaluating a placed service.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MigrationTrigger {
    /// Every step.
    Always,
    /// The user's attachment differs from the previous step.  A first
    /// attachment counts as a change.
    #[default]
    BaseStationChanged,
    /// The graph distance from the user to the hosting cloud changed.  With
    /// no previous attachment the previous distance is taken as 0.
    LatencyChanged,
}

impl MigrationTrigger {
    pub fn should_trigger(&self, network: &CloudNetwork, population: &Population, service: ServiceId) -> PlacementResult<bool> {
        match self {
            MigrationTrigger::Always => Ok(true),
            MigrationTrigger::BaseStationChanged => Ok(population.owner(service)?.base_station_changed()),
            MigrationTrigger::LatencyChanged => {
                let cloud = population.get_service(service)?.placed_cloud()?;
                let cloud_node = network.cloud(cloud)?.node();
                let now = network.distance(population.user_node(service)?, cloud_node);
                let before = match population.previous_user_node(service)? {
                    Some(prev) => network.distance(prev, cloud_node),
                    None => 0.0,
                };
                Ok(before != now)
            }
        }
    }
}
