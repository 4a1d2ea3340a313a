//! `mec-core`: foundational types for the `mecsim` edge placement simulator.
//!
//! This crate is a dependency of every other `mec-*` crate.  It has no
//! `mec-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                |
//! |-----------|---------------------------------------------------------|
//! | [`ids`]   | `NodeId`, `CloudId`, `ServiceId`, `UserId`              |
//! | [`geo`]   | `Vec2` planar position, `Aabb2` bounding box            |
//! | [`time`]  | `Step`, `SimClock`, `SimConfig`                         |
//! | [`rng`]   | `UserRng` (per-user), `SimRng` (global)                 |
//! | [`error`] | `CoreError`, `CoreResult`                               |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult};
pub use geo::{Aabb2, Vec2};
pub use ids::{CloudId, NodeId, ServiceId, UserId};
pub use rng::{SimRng, UserRng};
pub use time::{SimClock, SimConfig, Step};
