//! # Engine Module
//!
//! This module holds the control logic of a run: the interface an MD engine exposes to
//! the drivers, a reference implementation of it, and the warmup controller that removes
//! initial particle overlaps before production.
//!
//! ## Overview
//!
//! A freshly placed system usually contains particles sitting almost on top of each
//! other. Integrating it directly would produce enormous forces and blow up. The
//! [`warmup`] controller advances the system in short bursts while adjusting a control
//! parameter (a growing force cap, or a steepest-descent minimizer) until the minimum
//! pairwise distance reaches a threshold or the iteration budget is spent, and then hands
//! the engine over in a state ready for production.
//!
//! ## Architecture
//!
//! - **Collaborator interface** ([`simulation`]) - The `SimulationEngine` and `SystemEngine`
//!   traits, integrator and thermostat settings
//! - **Reference engine** ([`reference`]) - An all-pairs implementation for small systems
//! - **Capabilities** ([`features`]) - Optional engine features and precondition checks
//! - **Configuration** ([`config`]) - Warmup policies and per-workflow run parameters
//! - **State Tracking** ([`state`]) - Warmup phases, per-burst records and the outcome
//! - **Progress Monitoring** ([`progress`]) - Progress events for a user interface
//! - **Error Handling** ([`error`]) - Engine-level error type

pub mod config;
pub mod error;
pub mod features;
pub mod progress;
pub mod reference;
pub mod simulation;
pub mod state;
pub mod warmup;
