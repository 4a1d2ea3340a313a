//! square: compares placement strategies on a small edge network.
//!
//! Users wander over a 4×4 grid of base stations, each with a small
//! cloudlet, plus a central cloud behind a backhaul hub.  Every strategy
//! sees the same network, the same users and the same movement, and the
//! per-step statistics are written under `output/square/<strategy>/`.
//!
//! Usage: `square [config.json]`, where the optional file holds a `SimConfig`.
//! Set `RUST_LOG=debug` to follow individual placement decisions.

mod network;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use env_logger::Builder;

use mec_core::{SimConfig, SimRng};
use mec_output::{CsvWriter, SimOutputObserver, StatisticsObserver};
use mec_placement::{
    BranchAndBoundOptimizer, CostKind, Displacement, DistanceMeasure, IndependentStrategy, MigrationAlgorithm,
    MyopicOptimalStrategy, PerServiceAverageCost, PlacementStrategy, StaticGreedyStrategy, UtilityFunction,
};
use mec_resource::{CloudNetwork, ConstantServiceModel, MovementKind, Population, UniformConfigurator};
use mec_sim::SimBuilder;

use network::build_network;

// ── Constants ─────────────────────────────────────────────────────────────────

const USER_COUNT:        usize = 24;
const USER_SPEED:        f64   = 1.5; // units per second
const MYOPIC_INTERVAL:   u64   = 5;
const BNB_NODE_LIMIT:    u64   = 200_000;
const SNAPSHOT_INTERVAL: u64   = 10;

// ── Results ───────────────────────────────────────────────────────────────────

struct RunSummary {
    label:           String,
    mean_cost:       f64,
    dissatisfaction: f64,
    mean_latency:    f64,
    migrations:      u64,
    wall_secs:       f64,
}

// ── Scenario ──────────────────────────────────────────────────────────────────

fn load_config() -> Result<SimConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

/// The same users for every run: positions and services derive from the seed.
fn spawn_population(network: &CloudNetwork, seed: u64) -> Result<Population> {
    let area = network.bounding_box().context("network has no node positions")?;
    let services = UniformConfigurator::with_seed(1..=3, 1..=2, 2..=8, seed);
    let mut population = Population::new(ConstantServiceModel::new(1, services));
    let mut rng = SimRng::new(seed);
    population.spawn_random_users(USER_COUNT, MovementKind::Brownian { speed: USER_SPEED }, area, &mut rng)?;
    Ok(population)
}

fn run<S, F>(label: &str, config: &SimConfig, out_root: &Path, make_strategy: F) -> Result<RunSummary>
where
    S: PlacementStrategy + 'static,
    F: FnOnce(&CloudNetwork) -> S,
{
    let network = build_network()?;
    let population = spawn_population(&network, config.seed)?;
    let strategy = make_strategy(&network);
    let mut sim = SimBuilder::new(config.clone(), network, population, strategy).build()?;

    let dir = out_root.join(label);
    std::fs::create_dir_all(&dir)?;
    let writer = CsvWriter::new(&dir)?;
    let mut csv = SimOutputObserver::new(writer, global_cost()).with_snapshot_interval(SNAPSHOT_INTERVAL);
    let mut stats = StatisticsObserver::new(global_cost());

    log::info!("{label}: {} users, writing to {}", sim.population().num_users(), dir.display());
    let t0 = Instant::now();
    sim.run(&mut (&mut stats, &mut csv))?;
    let wall_secs = t0.elapsed().as_secs_f64();

    if let Some(e) = csv.take_error() {
        log::error!("{label}: output error: {e}");
    }
    if let Some(e) = stats.take_error() {
        log::error!("{label}: statistics error: {e}");
    }
    log::info!("{label}: {} migrations in {wall_secs:.3} s", stats.total_migrations());

    Ok(RunSummary {
        label: label.to_owned(),
        mean_cost: stats.mean_global_cost().unwrap_or(0.0),
        dissatisfaction: stats.mean_dissatisfaction_rate().unwrap_or(0.0),
        mean_latency: stats.mean_latency().unwrap_or(0.0),
        migrations: stats.total_migrations(),
        wall_secs,
    })
}

fn global_cost() -> PerServiceAverageCost<CostKind> {
    PerServiceAverageCost::new(CostKind::Latency { factor: 1.0, migration_cost: 1.0 })
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    Builder::from_default_env().format_timestamp(None).init();

    let config = load_config()?;
    log::debug!("config: {config:?}");
    println!("=== square: mecsim strategy comparison ===");
    println!(
        "Users: {USER_COUNT}  |  Steps: {}  |  Step: {} s  |  Seed: {}",
        config.total_steps, config.step_duration_secs, config.seed
    );
    println!();

    let out_root = PathBuf::from("output/square");
    let cost = CostKind::latency();
    let closest = MigrationAlgorithm::ClosestInNeighborhood {
        neighborhood:   4,
        only_available: true,
        metric:         DistanceMeasure::Hops,
        furthest:       false,
    };
    let utility = MigrationAlgorithm::HighestUtility {
        neighborhood: 4,
        utility:      UtilityFunction::PriorityWeightedLatency,
        displacement: Displacement::Greedy,
    };

    let runs = vec![
        run("never", &config, &out_root, |net| IndependentStrategy::new(net, MigrationAlgorithm::Never, cost))?,
        run("always", &config, &out_root, |net| {
            IndependentStrategy::new(net, MigrationAlgorithm::Always { only_available: true }, cost)
        })?,
        run("closest", &config, &out_root, |net| IndependentStrategy::new(net, closest, cost))?,
        run("highest-utility", &config, &out_root, |net| {
            IndependentStrategy::new(net, utility, cost).with_seed(config.seed)
        })?,
        run("static-greedy", &config, &out_root, |_| StaticGreedyStrategy::new())?,
        run("myopic-optimal", &config, &out_root, |_| {
            MyopicOptimalStrategy::new(BranchAndBoundOptimizer::new(BNB_NODE_LIMIT), cost, MYOPIC_INTERVAL)
        })?,
    ];

    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>10} {:>9}",
        "Strategy", "Cost", "Dissat.", "Latency", "Migr.", "Wall (s)"
    );
    println!("{}", "-".repeat(70));
    for r in &runs {
        println!(
            "{:<16} {:>10.3} {:>10.3} {:>10.3} {:>10} {:>9.3}",
            r.label, r.mean_cost, r.dissatisfaction, r.mean_latency, r.migrations, r.wall_secs
        );
    }
    println!();
    println!("CSV output written under {}", out_root.display());
    Ok(())
}
