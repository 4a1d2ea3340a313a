//! Placement actions: the per-step vocabulary of placement decisions.

use std::fmt;

use mec_core::{CloudId, ServiceId};

/// One placement decision for one service.  Created fresh every step.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// First placement of a new service.
    InitialPlacement { service: ServiceId, cloud: CloudId },

    /// Move between two different clouds.
    Migration { service: ServiceId, source: CloudId, target: CloudId },

    /// Stay where it is.
    NoMigration { service: ServiceId, cloud: CloudId },
}

impl Action {
    /// `Migration` from `source` to `target`, or `NoMigration` if they are
    /// the same cloud.
    pub fn towards(service: ServiceId, source: CloudId, target: CloudId) -> Self {
        if source == target {
            Action::NoMigration { service, cloud: source }
        } else {
            Action::Migration { service, source, target }
        }
    }

    #[inline]
    pub fn service(&self) -> ServiceId {
        match *self {
            Action::InitialPlacement { service, .. }
            | Action::Migration { service, .. }
            | Action::NoMigration { service, .. } => service,
        }
    }

    /// Cloud hosting the service once the action is applied.
    #[inline]
    pub fn resulting_cloud(&self) -> CloudId {
        match *self {
            Action::InitialPlacement { cloud, .. } => cloud,
            Action::Migration { target, .. }       => target,
            Action::NoMigration { cloud, .. }      => cloud,
        }
    }

    #[inline]
    pub fn is_migration(&self) -> bool {
        matches!(self, Action::Migration { .. })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::InitialPlacement { service, cloud } => write!(f, "place {service} on {cloud}"),
            Action::Migration { service, source, target } => write!(f, "migrate {service} {source} -> {target}"),
            Action::NoMigration { service, cloud } => write!(f, "keep {service} on {cloud}"),
        }
    }
}
