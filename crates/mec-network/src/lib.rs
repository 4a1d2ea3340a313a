//! `mec-network`: network graph, distance oracle, and RAN attachment.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | [`graph`]  | `Network` (CSR adjacency), `NetworkBuilder`, `NodeKind`      |
//! | [`oracle`] | `DistanceOracle` (Floyd–Warshall + bounded k-nearest search) |
//! | [`ran`]    | `RanModel` trait, `GridRanModel`, `BruteForceRanModel`, `RTreeRanModel` |
//! | [`error`]  | `NetworkError`, `NetworkResult<T>`                           |
//!
//! The graph is built once per scenario and never mutated afterwards.  The
//! oracle takes ownership of the built `Network` so that the cached distance
//! matrix can never drift from the topology it was computed over.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.     |

pub mod error;
pub mod graph;
pub mod oracle;
pub mod ran;


pub use error::{NetworkError, NetworkResult};
pub use graph::{Network, NetworkBuilder, NodeKind, DEFAULT_ACCESS_LATENCY, DEFAULT_CONNECTION_WEIGHT};
pub use oracle::{DistanceOracle, HopMetric, UNREACHABLE};
pub use ran::{brute_force_nearest, BruteForceRanModel, GridRanModel, RTreeRanModel, RanModel};
