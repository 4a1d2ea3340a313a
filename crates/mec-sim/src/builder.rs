//! Fluent builder for constructing a [`Simulation`].

use mec_core::SimConfig;
use mec_network::{GridRanModel, RanModel};
use mec_placement::PlacementStrategy;
use mec_resource::{CloudNetwork, Population};

use crate::{SimError, SimResult, SimState, Simulation};

/// Fluent builder for [`Simulation`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total steps, step duration, seed, RAN grid resolution
/// - [`CloudNetwork`]: graph plus clouds, with at least one base station
/// - [`Population`]: users and their services (may be empty)
/// - `S: PlacementStrategy`: the placement strategy
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                                          |
/// |------------------|--------------------------------------------------|
/// | `.ran_model(r)`  | `GridRanModel` at `config.ran_grid_resolution`   |
///
/// # Example
///
/// ```rust,ignore
/// let strategy = IndependentStrategy::new(&network, algorithm, CostKind::latency());
/// let mut sim = SimBuilder::new(config, network, population, strategy).build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:     SimConfig,
    network:    CloudNetwork,
    population: Population,
    strategy:   Box<dyn PlacementStrategy>,
    ran:        Option<Box<dyn RanModel>>,
}

impl SimBuilder {
    /// Create a builder with all required inputs.
    pub fn new<S: PlacementStrategy + 'static>(
        config:     SimConfig,
        network:    CloudNetwork,
        population: Population,
        strategy:   S,
    ) -> Self {
        Self {
            config,
            network,
            population,
            strategy: Box::new(strategy),
            ran: None,
        }
    }

    /// Replace the default grid RAN model, e.g. with a
    /// [`BruteForceRanModel`](mec_network::BruteForceRanModel).
    pub fn ran_model<R: RanModel + 'static>(mut self, ran: R) -> Self {
        self.ran = Some(Box::new(ran));
        self
    }

    /// Validate inputs, build the RAN index, and return a ready-to-run
    /// [`Simulation`].
    pub fn build(self) -> SimResult<Simulation> {
        self.config.validate()?;
        if self.network.cloud_count() == 0 {
            return Err(SimError::Config("cloud network has no clouds".into()));
        }

        let ran: Box<dyn RanModel> = match self.ran {
            Some(ran) => ran,
            None => Box::new(GridRanModel::new(self.network.network(), self.config.ran_grid_resolution)?),
        };

        Ok(Simulation {
            clock:      self.config.make_clock(),
            config:     self.config,
            state:      SimState::default(),
            network:    self.network,
            population: self.population,
            strategy:   self.strategy,
            ran,
        })
    }
}
