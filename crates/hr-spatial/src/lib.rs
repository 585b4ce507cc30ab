//! `hr-spatial` — road network graph, nearest-node indexing, and graph ingest.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                  |
//! |-------------|-----------------------------------------------------------|
//! | [`network`] | `RoadNetwork` (CSR + R-tree), `RoadNetworkBuilder`, `EdgeRef` |
//! | [`loader`]  | `load_network_csv`, `load_network_reader`                 |
//! | [`error`]   | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                            |
//! |---------|---------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `hr-core` types. |

pub mod error;
pub mod loader;
pub mod network;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use loader::{load_network_csv, load_network_reader};
pub use network::{EdgeRef, RoadNetwork, RoadNetworkBuilder};
