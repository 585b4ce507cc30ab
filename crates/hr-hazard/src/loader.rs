//! Chunk data ingest and persistence.
//!
//! Two JSON formats are understood.
//!
//! # Snapshot
//!
//! The grid definition plus one value per chunk in `ChunkId` order:
//!
//! ```json
//! { "bbox": { "min_lat": 44.46, "min_lon": 11.25, "max_lat": 44.54, "max_lon": 11.42 },
//!   "step": 0.01,
//!   "values": [1.42, 1.07, ...] }
//! ```
//!
//! A grid whose borders differ from the regular `min + i · step` layout also
//! carries them: `"borders": { "lat": [...], "lon": [...] }`.
//!
//! # Chunk map
//!
//! The layout written by the precipitation collector: an object keyed by
//! chunk index, each entry carrying its four `[lat, lon]` corners and the
//! averaged precipitation value.
//!
//! ```json
//! { "0": { "coords": [[44.46, 11.25], [44.46, 11.26], [44.47, 11.26], [44.47, 11.25]],
//!          "precipitation_value_avg": 1.31 },
//!   "1": { ... } }
//! ```
//!
//! The collector advances its borders by repeated addition, so they drift
//! from `min + i · step` and the box usually ends in a sliver row and column.
//! The grid is therefore rebuilt from the distinct corner values of the
//! entries, in row-major index order.  The step only serves as the lookup
//! estimate and as a cross-check against the regular layout.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use hr_core::{ChunkId, GeoPoint};

use crate::grid::{BoundingBox, ChunkGrid};
use crate::{HazardError, HazardResult};

/// Largest gap (degrees) between an entry's corners and the borders of the
/// chunk with the same index.
const CORNER_TOLERANCE: f64 = 1e-9;

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Serializable form of a [`ChunkGrid`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardSnapshot {
    pub bbox:    BoundingBox,
    pub step:    f64,
    /// Present only for grids not laid out by [`ChunkGrid::build`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borders: Option<CellBorders>,
    pub values:  Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellBorders {
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl HazardSnapshot {
    pub fn from_grid(grid: &ChunkGrid) -> Self {
        let borders = (!grid.is_regular()).then(|| CellBorders {
            lat: grid.lat_edges().to_vec(),
            lon: grid.lon_edges().to_vec(),
        });
        Self {
            bbox: grid.bbox(),
            step: grid.step(),
            borders,
            values: grid.hazards().to_vec(),
        }
    }

    /// Rebuild the grid and validate every value.
    pub fn into_grid(self) -> HazardResult<ChunkGrid> {
        let grid = match self.borders {
            None => ChunkGrid::build(self.bbox, self.step)?,
            Some(CellBorders { lat, lon }) => {
                let grid = ChunkGrid::from_edges(lat, lon, self.step)?;
                if grid.bbox() != self.bbox {
                    return Err(HazardError::ChunkMismatch(format!(
                        "borders span {} but the snapshot box is {}",
                        grid.bbox(),
                        self.bbox
                    )));
                }
                grid
            }
        };
        grid.with_hazards(self.values)
    }
}

pub fn load_snapshot_json(path: &Path) -> HazardResult<ChunkGrid> {
    load_snapshot_reader(std::fs::File::open(path)?)
}

pub fn load_snapshot_reader<R: Read>(reader: R) -> HazardResult<ChunkGrid> {
    let snapshot: HazardSnapshot = serde_json::from_reader(reader)?;
    let grid = snapshot.into_grid()?;
    log::info!("loaded hazard snapshot: {} chunks over {}", grid.len(), grid.bbox());
    Ok(grid)
}

pub fn save_snapshot_json(grid: &ChunkGrid, path: &Path) -> HazardResult<()> {
    write_snapshot(grid, std::fs::File::create(path)?)
}

pub fn write_snapshot<W: Write>(grid: &ChunkGrid, writer: W) -> HazardResult<()> {
    serde_json::to_writer_pretty(writer, &HazardSnapshot::from_grid(grid))?;
    Ok(())
}

// ── Chunk map ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ChunkMapEntry {
    coords:                  Vec<[f64; 2]>,
    precipitation_value_avg: f64,
}

pub fn load_chunk_map_json(path: &Path, step: f64) -> HazardResult<ChunkGrid> {
    load_chunk_map_reader(std::fs::File::open(path)?, step)
}

/// Like [`load_chunk_map_json`] but accepts any `Read` source.
pub fn load_chunk_map_reader<R: Read>(reader: R, step: f64) -> HazardResult<ChunkGrid> {
    let raw: BTreeMap<String, ChunkMapEntry> = serde_json::from_reader(reader)?;

    let mut entries: Vec<(u32, ChunkMapEntry)> = raw
        .into_iter()
        .map(|(key, entry)| {
            key.trim()
                .parse::<u32>()
                .map(|index| (index, entry))
                .map_err(|_| HazardError::Parse(format!("invalid chunk index {key:?}")))
        })
        .collect::<HazardResult<_>>()?;
    entries.sort_by_key(|(index, _)| *index);

    if entries.is_empty() {
        return Err(HazardError::Parse("chunk map has no entries".to_owned()));
    }
    for (position, (index, _)) in entries.iter().enumerate() {
        if *index as usize != position {
            return Err(HazardError::ChunkNotFound(ChunkId(position as u32)));
        }
    }

    let cells: Vec<BoundingBox> = entries
        .iter()
        .map(|(_, e)| {
            let corners: Vec<GeoPoint> = e.coords.iter().map(|&[lat, lon]| GeoPoint::new(lat, lon)).collect();
            BoundingBox::from_corners(&corners)
        })
        .collect::<HazardResult<_>>()?;

    let lat_edges = borders(cells.iter().map(|c| (c.min_lat, c.max_lat)));
    let lon_edges = borders(cells.iter().map(|c| (c.min_lon, c.max_lon)));
    let grid = ChunkGrid::from_edges(lat_edges, lon_edges, step)?;

    if entries.len() != grid.len() {
        return Err(HazardError::ChunkCountMismatch {
            expected: grid.len(),
            got:      entries.len(),
        });
    }

    for (chunk, cell) in grid.chunks().zip(&cells) {
        let (sw, ne) = (chunk.south_west(), chunk.north_east());
        let lines_up = GeoPoint::new(cell.min_lat, cell.min_lon).approx_eq(sw, CORNER_TOLERANCE)
            && GeoPoint::new(cell.max_lat, cell.max_lon).approx_eq(ne, CORNER_TOLERANCE);
        if !lines_up {
            return Err(HazardError::ChunkMismatch(format!(
                "entry {} spans {cell}, {} spans {}",
                chunk.id.0,
                chunk.id,
                BoundingBox::from_corners(&chunk.corners)?
            )));
        }
    }

    let regular = ChunkGrid::build(grid.bbox(), step)?;
    if (regular.rows(), regular.cols()) != (grid.rows(), grid.cols()) {
        log::warn!(
            "chunk map is {}x{} but step {step} lays out {}x{}; keeping the map's borders",
            grid.rows(),
            grid.cols(),
            regular.rows(),
            regular.cols()
        );
    }

    let values = entries.iter().map(|(_, e)| e.precipitation_value_avg).collect();
    let grid = grid.with_hazards(values)?;
    log::info!("loaded chunk map: {} chunks ({}x{}) over {}", grid.len(), grid.rows(), grid.cols(), grid.bbox());
    Ok(grid)
}

/// Distinct lower borders in ascending order, closed by the highest upper
/// border.
fn borders(spans: impl Iterator<Item = (f64, f64)>) -> Vec<f64> {
    let mut lows = Vec::new();
    let mut high = f64::NEG_INFINITY;
    for (low, up) in spans {
        lows.push(low);
        high = high.max(up);
    }
    lows.sort_by(f64::total_cmp);
    lows.dedup();
    lows.push(high);
    lows
}
