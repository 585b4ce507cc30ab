//! `hr-hazard` — hazard chunk grid and chunk-data ingest.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`grid`]      | `BoundingBox`, `Chunk`, `ChunkGrid` (build + point lookup) |
//! | [`loader`]    | `HazardSnapshot`, snapshot and chunk-map JSON loaders      |
//! | [`synthetic`] | Seeded `[1, 2)` stand-in hazard values                     |
//! | [`error`]     | `HazardError`, `HazardResult<T>`                           |

pub mod error;
pub mod grid;
pub mod loader;
pub mod synthetic;


pub use error::{HazardError, HazardResult};
pub use grid::{BoundingBox, Chunk, ChunkGrid, DEFAULT_HAZARD, DEFAULT_STEP};
pub use loader::{
    CellBorders, HazardSnapshot, load_chunk_map_json, load_chunk_map_reader, load_snapshot_json,
    load_snapshot_reader, save_snapshot_json, write_snapshot,
};
pub use synthetic::{synthetic_hazards, synthetic_hazards_in};
