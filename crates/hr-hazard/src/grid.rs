//! Regular hazard grid over a geographic bounding box.
//!
//! # Layout
//!
//! The box is cut into rows of `step` degrees of latitude (from the southern
//! edge) and columns of `step` degrees of longitude (from the western edge).
//! The last row and column are clipped to the box, so the chunks tile it
//! exactly.  Chunks are numbered row-major:
//!
//! ```text
//! ChunkId = row * cols + col        (ChunkId::at / ChunkId::row_col)
//! ```
//!
//! Cell borders are stored once in `lat_edges` / `lon_edges`, so two
//! neighbouring chunks share bit-identical boundary values.
//! [`ChunkGrid::from_edges`] takes those borders as given, for chunk data
//! whose borders were accumulated rather than computed as `min + i · step`.
//!
//! # Lookup
//!
//! Chunk bounds are closed, so a point on a shared border is contained by
//! two (or four) chunks.  The first chunk in row-major order wins.
//! [`ChunkGrid::lookup_scan`] walks the chunks in order; [`ChunkGrid::lookup`]
//! computes the row and column directly and then nudges them onto the same
//! chunk the scan would pick.

use serde::{Deserialize, Serialize};

use hr_core::{ChunkId, GeoPoint};

use crate::{HazardError, HazardResult};

/// Hazard returned for points not covered by any chunk.  Neutral: no added
/// cost.
pub const DEFAULT_HAZARD: f64 = 1.0;

/// Default grid step in degrees.
pub const DEFAULT_STEP: f64 = 0.01;

// ── BoundingBox ───────────────────────────────────────────────────────────────

/// Axis-aligned latitude/longitude box.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Construct and validate.  Fails with
    /// [`HazardError::DegenerateBoundingBox`] if `min >= max` on either axis
    /// or a bound is not finite.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> HazardResult<Self> {
        let bbox = Self { min_lat, min_lon, max_lat, max_lon };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Smallest box containing every corner point.
    pub fn from_corners(corners: &[GeoPoint]) -> HazardResult<Self> {
        let mut bbox = Self {
            min_lat: f64::INFINITY,
            min_lon: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for p in corners {
            bbox.min_lat = bbox.min_lat.min(p.lat);
            bbox.min_lon = bbox.min_lon.min(p.lon);
            bbox.max_lat = bbox.max_lat.max(p.lat);
            bbox.max_lon = bbox.max_lon.max(p.lon);
        }
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> HazardResult<()> {
        let finite = [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_lat >= self.max_lat || self.min_lon >= self.max_lon {
            return Err(HazardError::DegenerateBoundingBox(*self));
        }
        Ok(())
    }

    /// Closed-interval containment test.
    #[inline]
    pub fn contains(&self, p: GeoPoint) -> bool {
        self.min_lat <= p.lat && p.lat <= self.max_lat
            && self.min_lon <= p.lon && p.lon <= self.max_lon
    }

    /// Area in square degrees.
    pub fn area_deg2(&self) -> f64 {
        (self.max_lat - self.min_lat) * (self.max_lon - self.min_lon)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}] x [{:.6}, {:.6}]",
            self.min_lat, self.max_lat, self.min_lon, self.max_lon
        )
    }
}

// ── Chunk ─────────────────────────────────────────────────────────────────────

/// One grid cell and its averaged hazard value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    /// Clockwise from the south-west corner:
    /// `(lat, lon)`, `(lat, next_lon)`, `(next_lat, next_lon)`, `(next_lat, lon)`.
    pub corners: [GeoPoint; 4],
    pub hazard: f64,
}

impl Chunk {
    pub fn south_west(&self) -> GeoPoint {
        self.corners[0]
    }

    pub fn north_east(&self) -> GeoPoint {
        self.corners[2]
    }

    /// Closed-interval containment test.
    pub fn contains(&self, p: GeoPoint) -> bool {
        let (sw, ne) = (self.south_west(), self.north_east());
        sw.lat <= p.lat && p.lat <= ne.lat && sw.lon <= p.lon && p.lon <= ne.lon
    }

    /// Area in square degrees.
    pub fn area_deg2(&self) -> f64 {
        let (sw, ne) = (self.south_west(), self.north_east());
        (ne.lat - sw.lat) * (ne.lon - sw.lon)
    }
}

// ── ChunkGrid ─────────────────────────────────────────────────────────────────

/// Read-only after construction; share it behind an `Arc`.
#[derive(Clone, Debug)]
pub struct ChunkGrid {
    bbox: BoundingBox,
    step: f64,
    /// `rows + 1` latitude borders, `lat_edges[rows] == bbox.max_lat`.
    lat_edges: Vec<f64>,
    /// `cols + 1` longitude borders, `lon_edges[cols] == bbox.max_lon`.
    lon_edges: Vec<f64>,
    hazards: Vec<f64>,
    default_hazard: f64,
}

impl ChunkGrid {
    /// Subdivide `bbox` into `step`-degree chunks, every hazard set to
    /// [`DEFAULT_HAZARD`].
    ///
    /// Complexity O(rows · cols).
    pub fn build(bbox: BoundingBox, step: f64) -> HazardResult<Self> {
        bbox.validate()?;
        if !step.is_finite() || step <= 0.0 {
            return Err(HazardError::InvalidStep(step));
        }

        let rows = cell_count(bbox.min_lat, bbox.max_lat, step);
        let cols = cell_count(bbox.min_lon, bbox.max_lon, step);
        let count = rows
            .checked_mul(cols)
            .filter(|&n| n < u32::MAX as usize)
            .ok_or(HazardError::GridTooLarge { rows, cols })?;

        let lat_edges = cell_edges(bbox.min_lat, bbox.max_lat, step, rows);
        let lon_edges = cell_edges(bbox.min_lon, bbox.max_lon, step, cols);

        log::debug!("built {rows}x{cols} chunk grid over {bbox} (step {step})");

        Ok(Self {
            bbox,
            step,
            lat_edges,
            lon_edges,
            hazards: vec![DEFAULT_HAZARD; count],
            default_hazard: DEFAULT_HAZARD,
        })
    }

    /// Grid over explicit cell borders, every hazard set to
    /// [`DEFAULT_HAZARD`].
    ///
    /// Both border lists must hold at least two finite, strictly increasing
    /// values.  `step` is the nominal cell size; lookup uses it as the first
    /// guess before settling on the exact cell.
    pub fn from_edges(lat_edges: Vec<f64>, lon_edges: Vec<f64>, step: f64) -> HazardResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(HazardError::InvalidStep(step));
        }
        check_edges("latitude", &lat_edges)?;
        check_edges("longitude", &lon_edges)?;

        let (rows, cols) = (lat_edges.len() - 1, lon_edges.len() - 1);
        let count = rows
            .checked_mul(cols)
            .filter(|&n| n < u32::MAX as usize)
            .ok_or(HazardError::GridTooLarge { rows, cols })?;
        let bbox = BoundingBox::new(lat_edges[0], lon_edges[0], lat_edges[rows], lon_edges[cols])?;

        log::debug!("built {rows}x{cols} chunk grid over {bbox} from explicit borders");

        Ok(Self {
            bbox,
            step,
            lat_edges,
            lon_edges,
            hazards: vec![DEFAULT_HAZARD; count],
            default_hazard: DEFAULT_HAZARD,
        })
    }

    /// Replace every hazard value at once.  `values` must have one entry per
    /// chunk in `ChunkId` order.
    pub fn with_hazards(mut self, values: Vec<f64>) -> HazardResult<Self> {
        if values.len() != self.len() {
            return Err(HazardError::ChunkCountMismatch {
                expected: self.len(),
                got:      values.len(),
            });
        }
        for (i, &v) in values.iter().enumerate() {
            check_hazard(ChunkId(i as u32), v)?;
        }
        self.hazards = values;
        Ok(self)
    }

    /// Value returned for points outside the grid.
    pub fn with_default_hazard(mut self, value: f64) -> HazardResult<Self> {
        check_hazard(ChunkId::INVALID, value)?;
        self.default_hazard = value;
        Ok(self)
    }

    pub fn set_hazard(&mut self, id: ChunkId, value: f64) -> HazardResult<()> {
        check_hazard(id, value)?;
        let slot = self
            .hazards
            .get_mut(id.index())
            .ok_or(HazardError::ChunkNotFound(id))?;
        *slot = value;
        Ok(())
    }

    /// Assign each chunk the value `f` returns for it, in `ChunkId` order.
    pub fn fill_with<F: FnMut(&Chunk) -> f64>(&mut self, mut f: F) -> HazardResult<()> {
        for i in 0..self.len() {
            let id = ChunkId(i as u32);
            let value = f(&self.chunk_unchecked(id));
            check_hazard(id, value)?;
            self.hazards[i] = value;
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn bbox(&self) -> BoundingBox { self.bbox }
    pub fn step(&self) -> f64 { self.step }
    pub fn rows(&self) -> usize { self.lat_edges.len() - 1 }
    pub fn cols(&self) -> usize { self.lon_edges.len() - 1 }
    pub fn len(&self) -> usize { self.hazards.len() }
    pub fn is_empty(&self) -> bool { self.hazards.is_empty() }
    pub fn default_hazard(&self) -> f64 { self.default_hazard }
    pub fn hazards(&self) -> &[f64] { &self.hazards }
    pub fn lat_edges(&self) -> &[f64] { &self.lat_edges }
    pub fn lon_edges(&self) -> &[f64] { &self.lon_edges }

    /// `true` if the borders are exactly those [`build`](Self::build) lays
    /// out for this box and step.
    pub fn is_regular(&self) -> bool {
        let rows = cell_count(self.bbox.min_lat, self.bbox.max_lat, self.step);
        let cols = cell_count(self.bbox.min_lon, self.bbox.max_lon, self.step);
        self.lat_edges == cell_edges(self.bbox.min_lat, self.bbox.max_lat, self.step, rows)
            && self.lon_edges == cell_edges(self.bbox.min_lon, self.bbox.max_lon, self.step, cols)
    }

    pub fn chunk(&self, id: ChunkId) -> Option<Chunk> {
        (id.index() < self.len()).then(|| self.chunk_unchecked(id))
    }

    /// All chunks in row-major `ChunkId` order.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.len()).map(|i| self.chunk_unchecked(ChunkId(i as u32)))
    }

    fn chunk_unchecked(&self, id: ChunkId) -> Chunk {
        let (row, col) = id.row_col(self.cols());
        let (lat, next_lat) = (self.lat_edges[row], self.lat_edges[row + 1]);
        let (lon, next_lon) = (self.lon_edges[col], self.lon_edges[col + 1]);
        Chunk {
            id,
            corners: [
                GeoPoint::new(lat, lon),
                GeoPoint::new(lat, next_lon),
                GeoPoint::new(next_lat, next_lon),
                GeoPoint::new(next_lat, lon),
            ],
            hazard: self.hazards[id.index()],
        }
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// The chunk containing `p`, first in row-major order on shared borders.
    ///
    /// O(1): row and column are computed from the offset into the box.
    pub fn locate(&self, p: GeoPoint) -> Option<ChunkId> {
        if !self.bbox.contains(p) {
            return None;
        }
        let row = axis_cell(&self.lat_edges, self.step, p.lat);
        let col = axis_cell(&self.lon_edges, self.step, p.lon);
        Some(ChunkId::at(row, col, self.cols()))
    }

    /// Hazard at `p`, or the default hazard if no chunk covers it.
    pub fn lookup(&self, p: GeoPoint) -> f64 {
        match self.locate(p) {
            Some(id) => self.hazards[id.index()],
            None => self.default_hazard,
        }
    }

    /// Same result as [`lookup`](Self::lookup) by testing every chunk in
    /// order.  O(N); kept as the reference behaviour.
    pub fn lookup_scan(&self, p: GeoPoint) -> f64 {
        self.chunks()
            .find(|c| c.contains(p))
            .map_or(self.default_hazard, |c| c.hazard)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Number of `step`-wide cells covering `[min, max]`.  Rounded so that a span
/// which is a whole multiple of `step` up to float error does not grow a
/// sliver cell.
fn cell_count(min: f64, max: f64, step: f64) -> usize {
    ((max - min) / step - 1e-9).ceil().max(1.0) as usize
}

fn cell_edges(min: f64, max: f64, step: f64, cells: usize) -> Vec<f64> {
    let mut edges: Vec<f64> = (0..cells).map(|i| min + i as f64 * step).collect();
    edges.push(max);
    edges
}

/// Index of the lowest cell whose closed interval contains `v`.  `v` must lie
/// within `[edges[0], edges[last]]`.
fn axis_cell(edges: &[f64], step: f64, v: f64) -> usize {
    let cells = edges.len() - 1;
    let mut i = (((v - edges[0]) / step).floor().max(0.0) as usize).min(cells - 1);
    // A border belongs to the lower cell.
    while i > 0 && v <= edges[i] {
        i -= 1;
    }
    while i + 1 < cells && v > edges[i + 1] {
        i += 1;
    }
    i
}

fn check_edges(axis: &str, edges: &[f64]) -> HazardResult<()> {
    if edges.len() < 2 {
        return Err(HazardError::InvalidBorders(format!("{axis}: need at least two borders")));
    }
    if edges.iter().any(|v| !v.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(HazardError::InvalidBorders(format!(
            "{axis}: borders must be finite and strictly increasing"
        )));
    }
    Ok(())
}

fn check_hazard(chunk: ChunkId, value: f64) -> HazardResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(HazardError::InvalidHazard { chunk, value })
    }
}
