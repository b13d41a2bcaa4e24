//! # Core Models Module
//!
//! Data structures that describe a particle simulation: particles with positions and
//! velocities, bonds between them, and the periodic box they live in.
//!
//! ## Key Components
//!
//! - [`ids`] - Stable identifiers for particles and bond types
//! - [`particle`] - A single point particle and the description used to insert one
//! - [`simulation_box`] - The orthorhombic periodic domain and minimum-image helpers
//! - [`system`] - The particle container with insertion order and bond list
//!
//! ## Usage
//!
//! ```ignore
//! use mdwarm::core::models::{simulation_box::SimulationBox, system::ParticleSystem};
//!
//! let mut system = ParticleSystem::new(SimulationBox::cubic(10.0)?);
//! let first = system.add_particle(Particle::new(Point3::new(1.0, 1.0, 1.0), ParticleType(0)));
//! ```

pub mod ids;
pub mod particle;
pub mod simulation_box;
pub mod system;
