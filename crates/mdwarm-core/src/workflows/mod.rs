//! # Workflows Module
//!
//! End-to-end runs. Each workflow builds a system on an engine, removes initial overlaps
//! with the warmup controller, equilibrates where needed, and then runs production while
//! streaming observables and trajectory frames to a [`RunOutputs`](crate::core::io::RunOutputs).
//!
//! - **Lennard-Jones fluid** ([`lj_liquid`]) - Argon-like particles at a scalable density
//!   and temperature, with energy and pressure observables.
//! - **Polymer** ([`polymer`]) - Bead-spring chains with WCA beads and FENE bonds, with
//!   radius-of-gyration observables.
//!
//! Every workflow has a `run` entry point that creates a [`ReferenceEngine`] and a
//! `run_on` entry point that drives any [`SystemEngine`] already sized to the run.
//! Warmup non-convergence never aborts a run; it is logged and reported in the
//! [`RunSummary`].
//!
//! [`ReferenceEngine`]: crate::engine::reference::ReferenceEngine
//! [`SystemEngine`]: crate::engine::simulation::SystemEngine

pub mod lj_liquid;
pub mod polymer;
mod production;

use crate::core::io::RunOutputs;
use crate::engine::error::EngineError;
use crate::engine::state::WarmupOutcome;
use std::io::Write;

/// What a completed run did.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub warmup: WarmupOutcome,
    pub production_iterations: usize,
    pub final_time: f64,
    pub particle_count: usize,
}

/// Writes the warmup records and the conclusion to the run log.
fn log_warmup<W: Write>(
    outputs: &mut RunOutputs<W>,
    outcome: &WarmupOutcome,
    threshold: f64,
) -> Result<(), EngineError> {
    for record in &outcome.records {
        outputs.log.line(record)?;
    }
    if outcome.converged {
        outputs.log.line(format_args!(
            "Warmup converged after {} iterations, minimal distance {:.6}",
            outcome.iterations, outcome.final_min_distance
        ))?;
    } else {
        outputs.log.line(format_args!(
            "Warmup stopped after {} iterations with minimal distance {:.6} below {:.6}; continuing",
            outcome.iterations, outcome.final_min_distance, threshold
        ))?;
    }
    Ok(())
}
