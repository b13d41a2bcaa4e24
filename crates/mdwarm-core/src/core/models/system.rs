use super::ids::{BondTypeId, ParticleId};
use super::particle::Particle;
use super::simulation_box::SimulationBox;
use nalgebra::Point3;
use slotmap::{SecondaryMap, SlotMap};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SystemError {
    #[error("Particle {0:?} does not exist in the system")]
    UnknownParticle(ParticleId),
    #[error("A particle cannot be bonded to itself")]
    SelfBond,
}

/// A bond between two particles, typed by a registered bonded interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bond {
    pub first: ParticleId,
    pub second: ParticleId,
    pub bond_type: BondTypeId,
}

/// Represents a complete particle system: the periodic box, the particles and their bonds.
///
/// Particles are stored in a slot map for stable ids, and their insertion order is kept
/// separately so that contiguous index ranges (for example a single polymer chain) can be
/// addressed the same way the placement routines produce them.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    /// The periodic domain.
    sim_box: SimulationBox,
    /// Primary storage for particles.
    particles: SlotMap<ParticleId, Particle>,
    /// Particle ids in insertion order.
    order: Vec<ParticleId>,
    /// All bonds in the system.
    bonds: Vec<Bond>,
}

impl ParticleSystem {
    /// Creates an empty system inside `sim_box`.
    pub fn new(sim_box: SimulationBox) -> Self {
        Self {
            sim_box,
            particles: SlotMap::with_key(),
            order: Vec::new(),
            bonds: Vec::new(),
        }
    }

    #[inline]
    pub fn simulation_box(&self) -> &SimulationBox {
        &self.sim_box
    }

    /// Inserts a particle and returns its id.
    pub fn add_particle(&mut self, particle: Particle) -> ParticleId {
        let id = self.particles.insert(particle);
        self.order.push(id);
        id
    }

    /// Adds a bond between two existing particles.
    ///
    /// # Errors
    ///
    /// Returns [`SystemError::UnknownParticle`] if either particle is missing, or
    /// [`SystemError::SelfBond`] if both ids are the same.
    pub fn add_bond(
        &mut self,
        first: ParticleId,
        second: ParticleId,
        bond_type: BondTypeId,
    ) -> Result<(), SystemError> {
        if first == second {
            return Err(SystemError::SelfBond);
        }
        for id in [first, second] {
            if !self.particles.contains_key(id) {
                return Err(SystemError::UnknownParticle(id));
            }
        }
        self.bonds.push(Bond {
            first,
            second,
            bond_type,
        });
        Ok(())
    }

    /// Retrieves a particle by id.
    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id)
    }

    /// Returns the number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Particle ids in insertion order.
    #[inline]
    pub fn ids(&self) -> &[ParticleId] {
        &self.order
    }

    /// Iterates over `(id, particle)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.order.iter().map(|&id| (id, &self.particles[id]))
    }

    /// Iterates mutably over `(id, particle)` pairs in insertion order.
    pub fn particles_mut(&mut self) -> impl Iterator<Item = (ParticleId, &mut Particle)> {
        let mut by_id: SecondaryMap<ParticleId, &mut Particle> =
            self.particles.iter_mut().collect();
        self.order
            .iter()
            .filter_map(move |&id| by_id.remove(id).map(|particle| (id, particle)))
    }

    /// Unfolded positions in insertion order.
    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.iter().map(|(_, p)| p.position).collect()
    }

    #[inline]
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }
}
