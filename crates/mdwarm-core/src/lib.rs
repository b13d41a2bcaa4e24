//! # mdwarm Core Library
//!
//! Drivers for small molecular-dynamics systems (a Lennard-Jones fluid and a
//! minimal bead-spring polymer) built around an explicit overlap-removal warmup
//! controller.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture so that the control logic can be
//! tested against any engine that implements the collaborator interface.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`ParticleSystem`), interaction
//!   parameters and pair potentials, analysis routines, particle placement and the
//!   plain-text output writers.
//!
//! - **[`engine`]: The Logic Core.** The `SimulationEngine` collaborator interface, a
//!   brute-force `ReferenceEngine` implementing it, feature preconditions, warmup
//!   policies and the warmup controller state machine.
//!
//! - **[`workflows`]: The Public API.** Complete runs (`lj_liquid`, `polymer`) that set
//!   up a system, warm it up, hand it to production and stream observables to disk.

pub mod core;
pub mod engine;
pub mod workflows;
