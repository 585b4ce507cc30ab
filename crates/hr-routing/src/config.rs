//! Routing configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! region = "bologna"
//! step = 0.01
//! default_hazard = 1.0
//! policy = "non_decreasing"   # or "raw"
//! max_route_weight = 250000.0 # optional
//!
//! [bbox]
//! min_lat = 44.46
//! min_lon = 11.25
//! max_lat = 44.54
//! max_lon = 11.42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use hr_hazard::{BoundingBox, ChunkGrid, DEFAULT_HAZARD, DEFAULT_STEP};

use crate::router::DijkstraRouter;
use crate::weights::HazardPolicy;
use crate::{RoutingError, RoutingResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Name of the served region, used in logs.
    pub region: String,

    /// Grid step in degrees.  Default: 0.01.
    pub step: f64,

    /// Hazard for points outside the grid.  Default: 1.0 (no added cost).
    pub default_hazard: f64,

    pub policy: HazardPolicy,

    /// Upper bound on route weight; heavier routes are reported as "no
    /// route".  `None` searches the whole graph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_route_weight: Option<f64>,

    /// Area covered by the hazard grid.  Default: Bologna city centre.
    pub bbox: BoundingBox,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            region:           "bologna".to_owned(),
            step:             DEFAULT_STEP,
            default_hazard:   DEFAULT_HAZARD,
            policy:           HazardPolicy::default(),
            max_route_weight: None,
            bbox:             BoundingBox {
                min_lat: 44.46,
                min_lon: 11.25,
                max_lat: 44.54,
                max_lon: 11.42,
            },
        }
    }
}

impl RoutingConfig {
    /// Parse and validate.
    pub fn from_toml_str(text: &str) -> RoutingResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RoutingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> RoutingResult<Self> {
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        log::info!("loaded routing config for {:?} from {}", config.region, path.display());
        Ok(config)
    }

    pub fn to_toml_string(&self) -> RoutingResult<String> {
        toml::to_string(self).map_err(|e| RoutingError::Config(e.to_string()))
    }

    pub fn validate(&self) -> RoutingResult<()> {
        self.bbox.validate()?;
        if !self.step.is_finite() || self.step <= 0.0 {
            return Err(RoutingError::Config(format!("step must be positive, got {}", self.step)));
        }
        if !self.default_hazard.is_finite() || self.default_hazard < 0.0 {
            return Err(RoutingError::Config(format!(
                "default_hazard must be non-negative, got {}",
                self.default_hazard
            )));
        }
        if let Some(limit) = self.max_route_weight
            && (limit.is_nan() || limit < 0.0)
        {
            return Err(RoutingError::Config(format!(
                "max_route_weight must be non-negative, got {limit}"
            )));
        }
        Ok(())
    }

    /// An empty grid (every hazard at the default) over the configured box.
    pub fn build_grid(&self) -> RoutingResult<ChunkGrid> {
        Ok(ChunkGrid::build(self.bbox, self.step)?.with_default_hazard(self.default_hazard)?)
    }

    pub fn router(&self) -> DijkstraRouter {
        match self.max_route_weight {
            Some(limit) => DijkstraRouter::with_max_weight(limit),
            None => DijkstraRouter::new(),
        }
    }
}
