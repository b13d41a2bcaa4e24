use super::error::EngineError;
use super::features::{Feature, require_features};
use super::simulation::{
    Integrator, Langevin, SimulationEngine, SteepestDescentParams, SystemEngine,
};
use crate::core::analysis::{self, EnergyReport, GyrationTensor};
use crate::core::forcefield::evaluation::{EvaluationError, evaluate};
use crate::core::forcefield::params::{BondedPotential, InteractionSet, NonBondedPotential};
use crate::core::models::ids::{BondTypeId, ParticleId, ParticleType};
use crate::core::models::particle::{NewParticle, Particle};
use crate::core::models::simulation_box::SimulationBox;
use crate::core::models::system::{ParticleSystem, SystemError};
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slotmap::SecondaryMap;
use tracing::{debug, instrument, trace};

type ForceMap = SecondaryMap<ParticleId, Vector3<f64>>;

/// Single-threaded, all-pairs molecular dynamics engine.
///
/// Integrates with velocity Verlet, optionally coupled to a Langevin thermostat, or
/// minimizes with steepest descent. Every force evaluation visits all particle pairs under
/// the minimum image, so it is meant for small systems and for driving the warmup
/// controller in tests.
pub struct ReferenceEngine {
    system: ParticleSystem,
    interactions: InteractionSet,
    time_step: f64,
    time: f64,
    force_cap: Option<f64>,
    thermostat: Option<Langevin>,
    integrator: Integrator,
    rng: StdRng,
    rng_seed: Option<u64>,
    disabled: Vec<Feature>,
}

impl ReferenceEngine {
    /// Creates an empty engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidControl`] unless `time_step` is finite and positive.
    pub fn new(sim_box: SimulationBox, time_step: f64) -> Result<Self, EngineError> {
        if !(time_step.is_finite() && time_step > 0.0) {
            return Err(EngineError::InvalidControl {
                name: "time_step",
                value: time_step,
            });
        }
        Ok(Self {
            system: ParticleSystem::new(sim_box),
            interactions: InteractionSet::new(),
            time_step,
            time: 0.0,
            force_cap: None,
            thermostat: None,
            integrator: Integrator::default(),
            rng: StdRng::seed_from_u64(0),
            rng_seed: None,
            disabled: Vec::new(),
        })
    }

    /// Hides `features`, for exercising workflows against a less capable engine.
    pub fn without_features(mut self, features: &[Feature]) -> Self {
        for feature in features {
            if !self.disabled.contains(feature) {
                self.disabled.push(*feature);
            }
        }
        self
    }

    #[inline]
    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Conservative forces, capped if a force cap is active, plus the Langevin forces.
    fn total_forces(&mut self) -> Result<ForceMap, EngineError> {
        let mut forces = evaluate(&self.system, &self.interactions)?.forces;

        if let Some(cap) = self.force_cap {
            for force in forces.values_mut() {
                let magnitude = force.norm();
                if magnitude > cap {
                    *force *= cap / magnitude;
                }
            }
        }

        if let Some(thermostat) = self.thermostat.filter(|t| t.gamma > 0.0) {
            let noise = (24.0 * thermostat.kt * thermostat.gamma / self.time_step).sqrt();
            for (id, particle) in self.system.iter() {
                if let Some(force) = forces.get_mut(id) {
                    let u = Vector3::new(
                        self.rng.r#gen::<f64>() - 0.5,
                        self.rng.r#gen::<f64>() - 0.5,
                        self.rng.r#gen::<f64>() - 0.5,
                    );
                    *force += -thermostat.gamma * particle.velocity + noise * u;
                }
            }
        }

        Ok(forces)
    }

    fn verlet_step(&mut self, forces: &mut ForceMap) -> Result<(), EngineError> {
        let dt = self.time_step;
        for (id, particle) in self.system.particles_mut() {
            let force = forces.get(id).copied().unwrap_or_else(Vector3::zeros);
            particle.velocity += 0.5 * dt * force / particle.mass;
            particle.position += dt * particle.velocity;
        }
        *forces = self.total_forces()?;
        for (id, particle) in self.system.particles_mut() {
            let force = forces.get(id).copied().unwrap_or_else(Vector3::zeros);
            particle.velocity += 0.5 * dt * force / particle.mass;
        }
        self.time += dt;
        self.check_finite()
    }

    /// One steepest-descent move. Returns `true` without moving anything once the largest
    /// force is below `f_max`.
    fn descent_step(&mut self, params: &SteepestDescentParams) -> Result<bool, EngineError> {
        let evaluation = evaluate(&self.system, &self.interactions)?;
        if params.f_max > 0.0 && evaluation.max_force() < params.f_max {
            return Ok(true);
        }
        for (id, particle) in self.system.particles_mut() {
            let force = evaluation
                .forces
                .get(id)
                .copied()
                .unwrap_or_else(Vector3::zeros);
            let mut displacement = params.gamma * force;
            let length = displacement.norm();
            if length > params.max_displacement {
                displacement *= params.max_displacement / length;
            }
            particle.position += displacement;
            particle.velocity = Vector3::zeros();
        }
        self.check_finite()?;
        Ok(false)
    }

    fn check_finite(&self) -> Result<(), EngineError> {
        for (_, particle) in self.system.iter() {
            if !particle.position.iter().all(|c| c.is_finite()) {
                return Err(EngineError::Unstable {
                    time: self.time,
                    quantity: "position",
                });
            }
            if !particle.velocity.iter().all(|c| c.is_finite()) {
                return Err(EngineError::Unstable {
                    time: self.time,
                    quantity: "velocity",
                });
            }
        }
        Ok(())
    }

    fn non_bonded_feature(potential: &NonBondedPotential) -> Feature {
        match potential {
            NonBondedPotential::LennardJones(_) => Feature::LennardJones,
            NonBondedPotential::Wca(_) => Feature::Wca,
        }
    }

    fn bonded_feature(potential: &BondedPotential) -> Feature {
        match potential {
            BondedPotential::Fene(_) => Feature::FeneBond,
            BondedPotential::Harmonic(_) => Feature::HarmonicBond,
        }
    }
}

impl SimulationEngine for ReferenceEngine {
    fn supports(&self, feature: Feature) -> bool {
        !self.disabled.contains(&feature)
    }

    fn min_distance(&self) -> f64 {
        analysis::min_distance(&self.system)
    }

    fn energy(&self) -> Result<EnergyReport, EngineError> {
        let evaluation = evaluate(&self.system, &self.interactions)?;
        Ok(EnergyReport::from_evaluation(&self.system, &evaluation))
    }

    fn force_cap(&self) -> Option<f64> {
        self.force_cap
    }

    fn set_force_cap(&mut self, cap: Option<f64>) -> Result<(), EngineError> {
        if let Some(value) = cap {
            require_features(&*self, &[Feature::ForceCap])?;
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidControl {
                    name: "force_cap",
                    value,
                });
            }
        }
        self.force_cap = cap;
        Ok(())
    }

    fn thermostat(&self) -> Option<Langevin> {
        self.thermostat
    }

    fn set_thermostat(&mut self, thermostat: Option<Langevin>) -> Result<(), EngineError> {
        if let Some(settings) = thermostat {
            require_features(&*self, &[Feature::LangevinThermostat])?;
            if !(settings.kt.is_finite() && settings.kt >= 0.0) {
                return Err(EngineError::InvalidControl {
                    name: "kt",
                    value: settings.kt,
                });
            }
            if !(settings.gamma.is_finite() && settings.gamma >= 0.0) {
                return Err(EngineError::InvalidControl {
                    name: "gamma",
                    value: settings.gamma,
                });
            }
            if self.rng_seed != Some(settings.seed) {
                self.rng = StdRng::seed_from_u64(settings.seed);
                self.rng_seed = Some(settings.seed);
            }
        }
        self.thermostat = thermostat;
        Ok(())
    }

    fn integrator(&self) -> Integrator {
        self.integrator
    }

    fn set_integrator(&mut self, integrator: Integrator) -> Result<(), EngineError> {
        if let Integrator::SteepestDescent(params) = &integrator {
            require_features(&*self, &[Feature::SteepestDescent])?;
            for (name, value) in [
                ("f_max", params.f_max),
                ("gamma", params.gamma),
                ("max_displacement", params.max_displacement),
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(EngineError::InvalidControl { name, value });
                }
            }
        }
        self.integrator = integrator;
        Ok(())
    }

    #[instrument(skip_all, name = "reference_integrate", fields(steps = steps))]
    fn integrate(&mut self, steps: u64) -> Result<u64, EngineError> {
        if steps == 0 || self.system.is_empty() {
            return Ok(0);
        }
        match self.integrator {
            Integrator::VelocityVerlet => {
                let mut forces = self.total_forces()?;
                for _ in 0..steps {
                    self.verlet_step(&mut forces)?;
                }
                trace!(time = self.time, "Velocity Verlet burst finished");
                Ok(steps)
            }
            Integrator::SteepestDescent(params) => {
                for done in 0..steps {
                    if self.descent_step(&params)? {
                        debug!(steps = done, "Steepest descent reached its force criterion");
                        return Ok(done);
                    }
                }
                Ok(steps)
            }
        }
    }

    fn zero_velocities(&mut self) {
        for (_, particle) in self.system.particles_mut() {
            particle.velocity = Vector3::zeros();
        }
    }

    fn time(&self) -> f64 {
        self.time
    }
}

impl SystemEngine for ReferenceEngine {
    fn simulation_box(&self) -> &SimulationBox {
        self.system.simulation_box()
    }

    fn set_non_bonded(
        &mut self,
        a: ParticleType,
        b: ParticleType,
        potential: NonBondedPotential,
    ) -> Result<(), EngineError> {
        require_features(&*self, &[Self::non_bonded_feature(&potential)])?;
        self.interactions.set_non_bonded(a, b, potential)?;
        Ok(())
    }

    fn add_bonded(&mut self, potential: BondedPotential) -> Result<BondTypeId, EngineError> {
        require_features(&*self, &[Self::bonded_feature(&potential)])?;
        Ok(self.interactions.add_bonded(potential)?)
    }

    fn add_particle(&mut self, new: NewParticle) -> Result<ParticleId, EngineError> {
        if !new.position.iter().all(|c| c.is_finite()) {
            return Err(EngineError::Unstable {
                time: self.time,
                quantity: "position",
            });
        }
        if !(new.mass.is_finite() && new.mass > 0.0) {
            return Err(EngineError::InvalidControl {
                name: "mass",
                value: new.mass,
            });
        }
        if let Some((bond_type, partner)) = new.bonded_to {
            if self.interactions.bonded(bond_type).is_none() {
                return Err(EvaluationError::UnknownBondType(bond_type).into());
            }
            if self.system.particle(partner).is_none() {
                return Err(SystemError::UnknownParticle(partner).into());
            }
        }

        let mut particle = Particle::new(new.position, new.particle_type);
        particle.mass = new.mass;
        let id = self.system.add_particle(particle);
        if let Some((bond_type, partner)) = new.bonded_to {
            self.system.add_bond(partner, id, bond_type)?;
        }
        Ok(id)
    }

    fn particle_count(&self) -> usize {
        self.system.len()
    }

    fn positions(&self) -> Vec<Point3<f64>> {
        self.system.positions()
    }

    fn pressure(&self) -> Result<f64, EngineError> {
        let evaluation = evaluate(&self.system, &self.interactions)?;
        Ok(analysis::pressure(&self.system, &evaluation))
    }

    fn gyration_tensor(&self, start: usize, count: usize) -> Result<GyrationTensor, EngineError> {
        Ok(analysis::gyration_tensor(&self.system, start, count)?)
    }
}
