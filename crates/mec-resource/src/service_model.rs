//! Service models: how many services a new user gets, and with which
//! requirements.

use std::ops::RangeInclusive;

use mec_core::SimRng;

use crate::{ResourceError, ResourceResult};

/// Requirements of one service.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceSpec {
    pub memory_requirement:  f64,
    pub latency_requirement: f64,
    pub priority:            f64,
}

impl ServiceSpec {
    /// A spec with priority 1.
    pub fn new(memory_requirement: f64, latency_requirement: f64) -> Self {
        Self { memory_requirement, latency_requirement, priority: 1.0 }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn validate(&self) -> ResourceResult<()> {
        let fields = [
            ("memory_requirement", self.memory_requirement),
            ("latency_requirement", self.latency_requirement),
            ("priority", self.priority),
        ];
        for (name, value) in fields {
            if !(value >= 0.0) {
                return Err(ResourceError::InvalidServiceSpec(format!("{name} = {value}")));
            }
        }
        if !self.memory_requirement.is_finite() {
            return Err(ResourceError::InvalidServiceSpec(format!(
                "memory_requirement = {}",
                self.memory_requirement
            )));
        }
        Ok(())
    }
}

// ── Configurators ─────────────────────────────────────────────────────────────

/// Produces the spec of each new service.
pub trait ServiceConfigurator: Send {
    fn configure(&mut self) -> ServiceSpec;
}

/// Every service gets the same spec.
#[derive(Copy, Clone, Debug)]
pub struct FixedConfigurator(pub ServiceSpec);

impl ServiceConfigurator for FixedConfigurator {
    fn configure(&mut self) -> ServiceSpec {
        self.0
    }
}

/// Draws integer priority, memory, and latency requirements uniformly from
/// inclusive ranges.
pub struct UniformConfigurator {
    priority: RangeInclusive<u32>,
    memory:   RangeInclusive<u32>,
    latency:  RangeInclusive<u32>,
    rng:      SimRng,
}

impl UniformConfigurator {
    pub const DEFAULT_SEED: u64 = 1337;

    pub fn new(priority: RangeInclusive<u32>, memory: RangeInclusive<u32>, latency: RangeInclusive<u32>) -> Self {
        Self::with_seed(priority, memory, latency, Self::DEFAULT_SEED)
    }

    pub fn with_seed(
        priority: RangeInclusive<u32>,
        memory:   RangeInclusive<u32>,
        latency:  RangeInclusive<u32>,
        seed:     u64,
    ) -> Self {
        Self { priority, memory, latency, rng: SimRng::new(seed) }
    }

    fn draw(rng: &mut SimRng, range: &RangeInclusive<u32>) -> f64 {
        if range.is_empty() {
            *range.start() as f64
        } else {
            rng.gen_range(range.clone()) as f64
        }
    }
}

impl ServiceConfigurator for UniformConfigurator {
    fn configure(&mut self) -> ServiceSpec {
        let priority = Self::draw(&mut self.rng, &self.priority);
        let memory   = Self::draw(&mut self.rng, &self.memory);
        let latency  = Self::draw(&mut self.rng, &self.latency);
        ServiceSpec::new(memory, latency).with_priority(priority)
    }
}

// ── Service models ────────────────────────────────────────────────────────────

/// Decides the services created alongside each new user.
pub trait ServiceModel: Send {
    fn create_user_services(&mut self) -> Vec<ServiceSpec>;
}

/// A fixed number of services per user, each configured by `C`.
pub struct ConstantServiceModel<C: ServiceConfigurator> {
    per_user:     usize,
    configurator: C,
}

impl<C: ServiceConfigurator> ConstantServiceModel<C> {
    pub fn new(per_user: usize, configurator: C) -> Self {
        Self { per_user, configurator }
    }
}

impl ConstantServiceModel<FixedConfigurator> {
    /// `per_user` identical services of `spec`.
    pub fn fixed(per_user: usize, spec: ServiceSpec) -> Self {
        Self::new(per_user, FixedConfigurator(spec))
    }
}

impl<C: ServiceConfigurator> ServiceModel for ConstantServiceModel<C> {
    fn create_user_services(&mut self) -> Vec<ServiceSpec> {
        (0..self.per_user).map(|_| self.configurator.configure()).collect()
    }
}
