use crate::core::io::RunOutputs;
use crate::engine::config::ProductionConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::SystemEngine;
use std::io::Write;
use tracing::{info, instrument};

/// Runs `config.iterations` bursts at the production temperature.
///
/// After every burst `observe` writes that iteration's observables, then a trajectory
/// frame is appended if enabled. Returns the number of iterations run.
#[instrument(skip_all, name = "production")]
pub(super) fn run_production<E, W, F>(
    engine: &mut E,
    config: &ProductionConfig,
    outputs: &mut RunOutputs<W>,
    reporter: &ProgressReporter,
    mut observe: F,
) -> Result<usize, EngineError>
where
    E: SystemEngine + ?Sized,
    W: Write,
    F: FnMut(&E, usize, &mut RunOutputs<W>) -> Result<(), EngineError>,
{
    engine.set_thermostat(Some(config.thermostat))?;
    info!(
        iterations = config.iterations,
        steps = config.steps_per_iteration,
        kt = config.thermostat.kt,
        "Starting production"
    );
    outputs.log.line(format_args!(
        "Production: {} iterations of {} steps at kT={}",
        config.iterations, config.steps_per_iteration, config.thermostat.kt
    ))?;

    reporter.report(Progress::PhaseStart { name: "Production" });
    reporter.report(Progress::TaskStart {
        total_steps: config.iterations as u64,
    });
    for iteration in 0..config.iterations {
        engine.integrate(config.steps_per_iteration)?;
        outputs
            .log
            .line(format_args!("run {iteration} at time={:.6}", engine.time()))?;
        observe(engine, iteration, outputs)?;
        if config.write_trajectory {
            if let Some(trajectory) = outputs.trajectory.as_mut() {
                trajectory.write_frame(&engine.positions())?;
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    outputs.flush()?;
    Ok(config.iterations)
}
