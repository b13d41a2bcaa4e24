//! # Force Field Module
//!
//! Interaction parameters, pair potentials and the all-pairs force evaluation used by
//! the reference engine and by the analysis routines.
//!
//! ## Overview
//!
//! Two families of interactions are supported:
//!
//! - **Non-bonded pair potentials** registered per unordered pair of particle types:
//!   a truncated and shifted Lennard-Jones potential and the purely repulsive
//!   Weeks-Chandler-Andersen (WCA) potential
//! - **Bonded potentials** registered once and referenced by bonds: the finitely
//!   extensible nonlinear elastic (FENE) spring and a harmonic spring
//!
//! ## Key Components
//!
//! - [`params`] - Parameter structures, validation and the [`params::InteractionSet`] registry
//! - [`potentials`] - Energy and force magnitude of every potential as plain functions
//! - [`evaluation`] - Forces, energies and virial for a whole [`ParticleSystem`]
//!
//! [`ParticleSystem`]: crate::core::models::system::ParticleSystem

pub mod evaluation;
pub mod params;
pub(crate) mod potentials;
