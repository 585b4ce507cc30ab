//! `hr-routing` — hazard-weighted routing over a road network.
//!
//! Data flows left to right:
//!
//! ```text
//! RoadNetwork + ChunkGrid ──▶ EdgeWeights ──▶ Router ──▶ Path ──▶ RouteGeometry
//! ```
//!
//! [`RoutingContext`] owns the shared graph and hazard data and runs the whole
//! pipeline for a [`RouteRequest`].
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`weights`]  | `EdgeWeights`, `HazardPolicy`, `compute_weights`          |
//! | [`router`]   | `Router` trait, `Path`, `DijkstraRouter`                  |
//! | [`geometry`] | `RouteSegment`, `RouteGeometry`, GeoJSON export           |
//! | [`request`]  | `RouteRequest` (validated endpoints)                      |
//! | [`config`]   | `RoutingConfig` (TOML)                                    |
//! | [`context`]  | `RoutingContext`, `RoutingSnapshot`, `RouteResult`        |
//! | [`error`]    | `RoutingError`, `RoutingResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                            |
//! |------------|---------------------------------------------------|
//! | `parallel` | Computes edge weights on the Rayon thread pool.   |

pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod request;
pub mod router;
pub mod weights;


pub use config::RoutingConfig;
pub use context::{RouteResult, RoutingContext, RoutingSnapshot};
pub use error::{RoutingError, RoutingResult};
pub use geometry::{RouteGeometry, RouteSegment, serialize_route};
pub use request::RouteRequest;
pub use router::{DijkstraRouter, Path, Router};
pub use weights::{EdgeWeights, HazardPolicy, compute_weights, compute_weights_sequential};
