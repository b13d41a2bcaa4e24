//! # Core Module
//!
//! This module provides the stateless building blocks of a particle simulation:
//! the particle and box models, interaction parameters, pair potentials and
//! the analysis routines that the engine exposes as queries.
//!
//! ## Architecture
//!
//! - **Particle Representation** ([`models`]) - Particles, bonds, the periodic box and the
//!   particle system container
//! - **Interactions** ([`forcefield`]) - Non-bonded and bonded parameter sets, potential
//!   functions and the all-pairs force evaluation
//! - **Analysis** ([`analysis`]) - Minimum distance, energies, pressure and gyration tensor
//! - **Placement** ([`placement`]) - Seeded random particle and polymer positions
//! - **File I/O** ([`io`]) - Observable tables, XYZ trajectories and the run log
//!
//! ## Units
//!
//! All quantities are in the reduced units of whatever parameter set the caller
//! registers. Energies reported by [`analysis`] use the same unit as the `epsilon`
//! and `k` parameters of the registered potentials.

pub mod analysis;
pub mod forcefield;
pub mod io;
pub mod models;
pub mod placement;
