use super::error::EngineError;
use super::features::Feature;
use crate::core::analysis::{EnergyReport, GyrationTensor};
use crate::core::forcefield::params::{BondedPotential, NonBondedPotential};
use crate::core::models::ids::{BondTypeId, ParticleId, ParticleType};
use crate::core::models::particle::NewParticle;
use crate::core::models::simulation_box::SimulationBox;
use nalgebra::Point3;

/// Langevin thermostat settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Langevin {
    /// Target temperature in energy units.
    pub kt: f64,
    /// Friction coefficient.
    pub gamma: f64,
    /// Seed of the thermostat noise.
    pub seed: u64,
}

impl Langevin {
    /// The same thermostat with a different target temperature.
    pub fn with_kt(self, kt: f64) -> Self {
        Self { kt, ..self }
    }
}

/// Parameters of the steepest-descent energy minimizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteepestDescentParams {
    /// Stop once the largest force falls below this value (`0` never stops early).
    pub f_max: f64,
    /// Displacement per unit force.
    pub gamma: f64,
    /// Upper bound on the displacement of a particle per step.
    pub max_displacement: f64,
}

/// How [`SimulationEngine::integrate`] advances the system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Integrator {
    #[default]
    VelocityVerlet,
    SteepestDescent(SteepestDescentParams),
}

/// The part of an engine the warmup controller drives: metric queries, control parameters
/// and time integration.
///
/// Implementors are owned by a single caller; every method that changes state takes
/// `&mut self` and blocks until the engine has finished.
pub trait SimulationEngine {
    /// Whether the engine provides `feature`.
    fn supports(&self, feature: Feature) -> bool;

    /// Smallest distance between any two particles.
    fn min_distance(&self) -> f64;

    fn energy(&self) -> Result<EnergyReport, EngineError>;

    fn force_cap(&self) -> Option<f64>;

    /// Caps the force magnitude on every particle, or removes the cap with `None`.
    fn set_force_cap(&mut self, cap: Option<f64>) -> Result<(), EngineError>;

    fn thermostat(&self) -> Option<Langevin>;

    fn set_thermostat(&mut self, thermostat: Option<Langevin>) -> Result<(), EngineError>;

    fn integrator(&self) -> Integrator;

    fn set_integrator(&mut self, integrator: Integrator) -> Result<(), EngineError>;

    /// Advances the system by up to `steps` steps and returns how many were performed.
    ///
    /// Steepest descent may stop early once its force criterion is met.
    fn integrate(&mut self, steps: u64) -> Result<u64, EngineError>;

    /// Sets every particle velocity to zero.
    fn zero_velocities(&mut self);

    /// Simulated time elapsed.
    fn time(&self) -> f64;
}

/// The full collaborator interface: system construction and analysis on top of
/// [`SimulationEngine`].
pub trait SystemEngine: SimulationEngine {
    fn simulation_box(&self) -> &SimulationBox;

    fn set_non_bonded(
        &mut self,
        a: ParticleType,
        b: ParticleType,
        potential: NonBondedPotential,
    ) -> Result<(), EngineError>;

    fn add_bonded(&mut self, potential: BondedPotential) -> Result<BondTypeId, EngineError>;

    /// Inserts a particle, bonding it to a previous particle if requested.
    fn add_particle(&mut self, particle: NewParticle) -> Result<ParticleId, EngineError>;

    fn particle_count(&self) -> usize;

    /// Unfolded positions in insertion order.
    fn positions(&self) -> Vec<Point3<f64>>;

    /// Scalar pressure.
    fn pressure(&self) -> Result<f64, EngineError>;

    /// Gyration tensor of the `count` particles inserted starting at index `start`.
    fn gyration_tensor(&self, start: usize, count: usize) -> Result<GyrationTensor, EngineError>;
}
