use super::ids::{BondTypeId, ParticleId, ParticleType};
use nalgebra::{Point3, Vector3};

/// A point particle in the simulation.
///
/// Positions are stored unfolded: a particle that leaves the box through one face keeps
/// its continuous trajectory, and only distance computations apply the minimum image.
/// This keeps chain statistics such as the radius of gyration meaningful.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Unfolded position.
    pub position: Point3<f64>,
    /// Current velocity.
    pub velocity: Vector3<f64>,
    /// Non-bonded type used to look up pair interactions.
    pub particle_type: ParticleType,
    /// Inertial mass.
    pub mass: f64,
}

impl Particle {
    /// Creates a resting particle of unit mass.
    ///
    /// # Arguments
    ///
    /// * `position` - The initial position.
    /// * `particle_type` - The non-bonded type tag.
    pub fn new(position: Point3<f64>, particle_type: ParticleType) -> Self {
        Self {
            position,
            velocity: Vector3::zeros(),
            particle_type,
            mass: 1.0,
        }
    }

    /// Returns the kinetic energy `m v² / 2`.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

/// Description of a particle to be inserted into an engine.
///
/// A new particle may optionally be linked to a previously inserted one through a
/// registered bonded interaction, which is how polymer chains are grown bead by bead.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParticle {
    pub position: Point3<f64>,
    pub particle_type: ParticleType,
    pub mass: f64,
    pub bonded_to: Option<(BondTypeId, ParticleId)>,
}

impl NewParticle {
    /// Creates the description of a type-0, unit-mass particle at `position`.
    pub fn at(position: Point3<f64>) -> Self {
        Self {
            position,
            particle_type: ParticleType::default(),
            mass: 1.0,
            bonded_to: None,
        }
    }

    pub fn with_type(mut self, particle_type: ParticleType) -> Self {
        self.particle_type = particle_type;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn bonded_to(mut self, bond_type: BondTypeId, partner: ParticleId) -> Self {
        self.bonded_to = Some((bond_type, partner));
        self
    }
}
