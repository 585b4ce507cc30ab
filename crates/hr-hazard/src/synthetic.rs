//! Seeded stand-in hazard values.
//!
//! Until real precipitation measurements are wired in, every chunk draws a
//! factor uniformly from `[1, 2)`.  The draw is seeded so that demos and
//! tests are reproducible: the same grid and seed always yield the same
//! values.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::{ChunkGrid, HazardError, HazardResult};

/// Lower bound (inclusive) of the stand-in hazard draw.
pub const SYNTHETIC_MIN: f64 = 1.0;
/// Upper bound (exclusive) of the stand-in hazard draw.
pub const SYNTHETIC_MAX: f64 = 2.0;

/// Fill `grid` with values drawn uniformly from `[SYNTHETIC_MIN, SYNTHETIC_MAX)`.
pub fn synthetic_hazards(grid: &mut ChunkGrid, seed: u64) -> HazardResult<()> {
    synthetic_hazards_in(grid, seed, SYNTHETIC_MIN, SYNTHETIC_MAX)
}

/// Fill `grid` with values drawn uniformly from `[low, high)`.
pub fn synthetic_hazards_in(grid: &mut ChunkGrid, seed: u64, low: f64, high: f64) -> HazardResult<()> {
    if !(low.is_finite() && high.is_finite() && low < high) {
        return Err(HazardError::InvalidRange { low, high });
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    grid.fill_with(|_| rng.gen_range(low..high))?;
    log::debug!("filled {} chunks with synthetic hazards (seed {seed})", grid.len());
    Ok(())
}
