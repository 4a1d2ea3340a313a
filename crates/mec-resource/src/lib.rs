//! `mec-resource`: clouds, services, users, and the cloud network.
//!
//! # Crate layout
//!
//! | Module            | Contents                                                   |
//! |-------------------|------------------------------------------------------------|
//! | [`cloud`]         | `Cloud`: capacity-checked service host bound to one node  |
//! | [`service`]       | `Service`: memory/latency requirements, latency cache     |
//! | [`user`]          | `User`: movement model, owned services, BS attachment     |
//! | [`movement`]      | `MovementModel` trait + static/linear/brownian/trace models |
//! | [`service_model`] | `ServiceSpec`, configurators, `ConstantServiceModel`       |
//! | [`network`]       | `CloudNetwork`, `CloudSpec`                                |
//! | [`population`]    | `Population`: owns users and services                     |
//! | [`invariant`]     | `InvariantViolation`                                       |
//! | [`error`]         | `ResourceError`, `ResourceResult<T>`                       |
//!
//! # Ownership
//!
//! `CloudNetwork` owns the graph (through its `DistanceOracle`) and every
//! `Cloud`.  `Population` owns every `User` and `Service`.  The two refer to
//! each other only by id: a cloud holds the ids of its hosted services, a
//! service holds the id of its current cloud.  Committed memory is changed
//! only by `Cloud::add_service` / `Cloud::remove_service`, which are reached
//! through `CloudNetwork::place_service` / `CloudNetwork::unplace_service`.

pub mod cloud;
pub mod error;
pub mod invariant;
pub mod movement;
pub mod network;
pub mod population;
pub mod service;
pub mod service_model;
pub mod user;


pub use cloud::Cloud;
pub use error::{ResourceError, ResourceResult};
pub use invariant::InvariantViolation;
pub use movement::{BrownianMovement, LinearMovement, MovementKind, MovementModel, StaticMovement, TraceMovement};
pub use network::{CloudNetwork, CloudSpec};
pub use population::Population;
pub use service::Service;
pub use service_model::{
    ConstantServiceModel, FixedConfigurator, ServiceConfigurator, ServiceModel, ServiceSpec,
    UniformConfigurator,
};
pub use user::User;
