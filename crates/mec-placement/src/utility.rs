//! Utility functions for the highest-utility migration policy.

use mec_core::{CloudId, NodeId};
use mec_resource::{CloudNetwork, Service};

/// Utility of hosting a service on a cloud, from the graph distance `dist`
/// between the user's base station and the cloud.  Higher is better.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UtilityFunction {
    /// `−priority · dist`
    #[default]
    PriorityWeightedLatency,
    /// `−dist²`
    SquaredLatency,
    /// `−priority` if `dist` exceeds the latency budget, else 0.
    PriorityWeightedSla,
}

impl UtilityFunction {
    /// Utility of `service` on `cloud` for a user attached at `user_node`.
    /// Unreachable or unknown clouds yield `−∞`.
    pub fn utility(&self, network: &CloudNetwork, service: &Service, user_node: NodeId, cloud: CloudId) -> f64 {
        let Ok(cloud) = network.cloud(cloud) else {
            return f64::NEG_INFINITY;
        };
        let dist = network.distance(user_node, cloud.node());
        if !dist.is_finite() {
            return f64::NEG_INFINITY;
        }
        match self {
            UtilityFunction::PriorityWeightedLatency => -service.priority() * dist,
            UtilityFunction::SquaredLatency => -(dist * dist),
            UtilityFunction::PriorityWeightedSla => {
                if dist > service.latency_requirement() { -service.priority() } else { 0.0 }
            }
        }
    }
}
