//! bologna — hazard-weighted routing demo over a synthetic Bologna network.
//!
//! Builds a street lattice over the city, covers it with 0.01° precipitation
//! chunks filled with seeded stand-in values, routes a handful of trips, and
//! writes the first route as GeoJSON.  Then the weather "changes" (a new
//! seed), the context is refreshed, and the same trips are routed again.
//!
//! ```text
//! cargo run -p bologna                     # default Bologna config
//! cargo run -p bologna -- routing.toml     # custom config
//! RUST_LOG=debug cargo run -p bologna      # per-request logging
//! ```

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use hr_core::GeoPoint;
use hr_hazard::{save_snapshot_json, synthetic_hazards};
use hr_routing::{RouteRequest, RoutingConfig, RoutingContext, RoutingError};

use network::{LANDMARKS, build_network};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:         u64 = 42;
const REFRESH_SEED: u64 = 7;
const OUTPUT_DIR:   &str = "output/bologna";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Configuration.
    let config = match std::env::args().nth(1) {
        Some(path) => RoutingConfig::load(Path::new(&path)).with_context(|| format!("loading {path}"))?,
        None => RoutingConfig::default(),
    };
    println!("=== bologna — hazard-weighted routing ===");
    println!(
        "Region: {}  |  Box: {}  |  Step: {}°  |  Policy: {:?}",
        config.region, config.bbox, config.step, config.policy
    );
    println!();

    // 2. Road network and hazard grid.
    let t0 = Instant::now();
    let network = build_network()?;
    let mut grid = config.build_grid()?;
    synthetic_hazards(&mut grid, SEED)?;
    println!(
        "Road network: {} nodes, {} edges  |  Chunks: {} ({}x{})  |  built in {:.3} s",
        network.node_count(),
        network.edge_count(),
        grid.len(),
        grid.rows(),
        grid.cols(),
        t0.elapsed().as_secs_f64()
    );

    let output = PathBuf::from(OUTPUT_DIR);
    std::fs::create_dir_all(&output)?;
    let snapshot_path = output.join("hazards.json");
    save_snapshot_json(&grid, &snapshot_path)?;
    tracing::info!("hazard snapshot written to {}", snapshot_path.display());

    // 3. Routing context.
    let context = RoutingContext::with_data(config, network, grid)?;

    let trips = [
        ("Stazione Centrale", LANDMARKS.stazione_centrale, "Piazza Maggiore", LANDMARKS.piazza_maggiore),
        ("Piazza Maggiore", LANDMARKS.piazza_maggiore, "Sant'Orsola", LANDMARKS.sant_orsola),
        ("Aeroporto", LANDMARKS.aeroporto, "Sant'Orsola", LANDMARKS.sant_orsola),
        ("San Luca", LANDMARKS.san_luca, "Stazione Centrale", LANDMARKS.stazione_centrale),
        ("Piazza Maggiore", LANDMARKS.piazza_maggiore, "Piazza Maggiore", LANDMARKS.piazza_maggiore),
    ];

    println!();
    println!("Weather A (seed {SEED})");
    let before = run_trips(&context, &trips)?;

    // 4. First route as GeoJSON.
    let (_, start, _, end) = trips[0];
    let route = context.route(&RouteRequest::from_points(start, end)?)?;
    let geojson_path = output.join("route.geojson");
    std::fs::write(&geojson_path, route.geometry.to_geojson_string()?)?;
    println!("  wrote {} ({} segments)", geojson_path.display(), route.geometry.len());

    // 5. New weather, same network.
    let mut grid = context.config().build_grid()?;
    synthetic_hazards(&mut grid, REFRESH_SEED)?;
    context.refresh_hazards(grid)?;

    println!();
    println!("Weather B (seed {REFRESH_SEED})");
    let after = run_trips(&context, &trips)?;

    println!();
    println!("{:<40} {:>12} {:>12}", "Trip", "Weight A", "Weight B");
    println!("{}", "-".repeat(66));
    for ((from, _, to, _), (a, b)) in trips.iter().zip(before.iter().zip(after.iter())) {
        println!("{:<40} {:>12} {:>12}", format!("{from} → {to}"), fmt_weight(*a), fmt_weight(*b));
    }

    Ok(())
}

/// Route every trip and print a line per trip.  Returns the total weight of
/// each, `None` where no route exists.
fn run_trips(context: &RoutingContext, trips: &[(&str, GeoPoint, &str, GeoPoint)]) -> Result<Vec<Option<f64>>> {
    let mut weights = Vec::with_capacity(trips.len());
    for &(from_name, from, to_name, to) in trips {
        let request = RouteRequest::from_points(from, to)?;
        let t0 = Instant::now();
        match context.route(&request) {
            Ok(result) => {
                println!(
                    "  {from_name} → {to_name}: {} nodes, {} segments, weight {:.1}{}  ({:.2} ms)",
                    result.path.nodes.len(),
                    result.geometry.len(),
                    result.path.total_weight,
                    if context.covers(from) && context.covers(to) { "" } else { "  [outside region]" },
                    t0.elapsed().as_secs_f64() * 1e3
                );
                weights.push(Some(result.path.total_weight));
            }
            Err(RoutingError::NoPath { .. }) => {
                println!("  {from_name} → {to_name}: no route");
                weights.push(None);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(weights)
}

fn fmt_weight(weight: Option<f64>) -> String {
    weight.map_or_else(|| "-".to_owned(), |w| format!("{w:.1}"))
}
