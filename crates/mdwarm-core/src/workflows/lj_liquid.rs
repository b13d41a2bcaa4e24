use super::production::run_production;
use super::{RunSummary, log_warmup};
use crate::core::forcefield::params::{LennardJonesParams, NonBondedPotential, Shift};
use crate::core::io::RunOutputs;
use crate::core::io::observables::EnergyObservables;
use crate::core::models::ids::ParticleType;
use crate::core::models::particle::NewParticle;
use crate::core::models::simulation_box::SimulationBox;
use crate::core::placement::random_positions;
use crate::engine::config::LjLiquidConfig;
use crate::engine::error::EngineError;
use crate::engine::features::{Feature, require_features};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reference::ReferenceEngine;
use crate::engine::simulation::SystemEngine;
use crate::engine::warmup::run_warmup;
use std::io::Write;
use tracing::{info, instrument};

/// Runs the Lennard-Jones fluid on a fresh [`ReferenceEngine`] sized from `config`.
#[instrument(skip_all, name = "lj_liquid_workflow")]
pub fn run<W: Write>(
    config: &LjLiquidConfig,
    outputs: &mut RunOutputs<W>,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    config.validate()?;
    let sim_box = SimulationBox::cubic(config.box_length())?;
    let mut engine = ReferenceEngine::new(sim_box, config.time_step)?;
    run_on(&mut engine, config, outputs, reporter)
}

/// Runs the Lennard-Jones fluid on `engine`, whose box should match
/// [`LjLiquidConfig::box_length`].
///
/// # Errors
///
/// Fails with [`EngineError::MissingFeatures`] before touching the engine if it lacks
/// Lennard-Jones interactions, the Langevin thermostat, or the warmup rule's feature.
pub fn run_on<E, W>(
    engine: &mut E,
    config: &LjLiquidConfig,
    outputs: &mut RunOutputs<W>,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError>
where
    E: SystemEngine + ?Sized,
    W: Write,
{
    require_features(
        &*engine,
        &[
            Feature::LennardJones,
            Feature::LangevinThermostat,
            config.warmup.rule.required_feature(),
        ],
    )?;
    config.validate()?;

    reporter.report(Progress::PhaseStart { name: "Setup" });
    let n_part = config.particle_count();
    let box_l = engine.simulation_box().lengths().x;
    info!(
        particles = n_part,
        box_l,
        density = config.density(),
        temperature = config.temperature(),
        "Setting up Lennard-Jones fluid"
    );
    outputs.log.line(format_args!(
        "Simulate {n_part} particles in a cubic box {box_l:.4} at density {:.6e}",
        config.density()
    ))?;

    let lj = LennardJonesParams {
        epsilon: config.epsilon(),
        sigma: config.sigma,
        cutoff: config.cutoff(),
        shift: Shift::Auto,
    };
    engine.set_non_bonded(
        ParticleType(0),
        ParticleType(0),
        NonBondedPotential::LennardJones(lj),
    )?;
    outputs.log.line(format_args!(
        "LJ interaction: epsilon={:.6} sigma={} cutoff={}",
        lj.epsilon, lj.sigma, lj.cutoff
    ))?;

    let positions = random_positions(n_part, engine.simulation_box(), config.placement_seed);
    for position in positions {
        engine.add_particle(NewParticle::at(position))?;
    }
    let start_distance = engine.min_distance();
    outputs
        .log
        .line(format_args!("Start with minimal distance {start_distance:.6}"))?;
    reporter.report(Progress::PhaseFinish);

    let warmup = run_warmup(engine, &config.warmup, reporter)?;
    log_warmup(outputs, &warmup, config.warmup.min_distance)?;

    let production_iterations = run_production(
        engine,
        &config.production,
        outputs,
        reporter,
        |engine, iteration, outputs| {
            let energy = engine.energy()?;
            outputs.observables.write_row(&EnergyObservables {
                iteration,
                time: engine.time(),
                kinetic: energy.kinetic,
                potential: energy.potential(),
                total: energy.total(),
                pressure: engine.pressure()?,
            })?;
            Ok(())
        },
    )?;

    Ok(RunSummary {
        warmup,
        production_iterations,
        final_time: engine.time(),
        particle_count: engine.particle_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{ProductionConfig, Scales};
    use crate::engine::simulation::Langevin;

    fn small_config() -> LjLiquidConfig {
        LjLiquidConfig {
            scales: Scales::default(),
            base_particles: 8,
            base_density: 0.1,
            production: ProductionConfig {
                iterations: 3,
                steps_per_iteration: 5,
                thermostat: Langevin {
                    kt: 1.0,
                    gamma: 1.0,
                    seed: 42,
                },
                write_trajectory: true,
            },
            ..LjLiquidConfig::default()
        }
    }

    fn buffers() -> RunOutputs<Vec<u8>> {
        RunOutputs::new(Vec::new(), Vec::new(), Some(Vec::new()))
    }

    #[test]
    fn run_writes_one_row_and_frame_per_production_iteration() {
        let config = small_config();
        let mut outputs = buffers();
        let summary = run(&config, &mut outputs, &ProgressReporter::new()).unwrap();

        assert_eq!(summary.particle_count, 8);
        assert_eq!(summary.production_iterations, 3);
        assert!(summary.warmup.records.len() <= 10);
        assert!((summary.final_time - 3.0 * 5.0 * 0.01).abs() < 1e-9);

        let RunOutputs {
            log,
            observables,
            trajectory,
        } = outputs;
        let table = String::from_utf8(observables.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "iteration,time,kinetic,potential,total,pressure");
        assert_eq!(lines.len(), 4);

        let trajectory = trajectory.unwrap();
        assert_eq!(trajectory.frames(), 3);
        let xyz = String::from_utf8(trajectory.into_inner()).unwrap();
        assert_eq!(xyz.lines().count(), 3 * (2 + 8));

        let log = String::from_utf8(log.into_inner()).unwrap();
        assert!(log.contains("Simulate 8 particles"));
        assert!(log.contains("Start with minimal distance"));
        assert!(log.contains("run 2 at time="));
    }

    #[test]
    fn identical_configs_produce_identical_observables() {
        let run_once = || {
            let mut outputs = buffers();
            run(&small_config(), &mut outputs, &ProgressReporter::new()).unwrap();
            outputs.observables.into_inner().unwrap()
        };
        assert_eq!(run_once(), run_once());
    }

    #[test]
    fn engine_without_lennard_jones_is_rejected_before_setup() {
        let config = small_config();
        let sim_box = SimulationBox::cubic(config.box_length()).unwrap();
        let mut engine = ReferenceEngine::new(sim_box, 0.01)
            .unwrap()
            .without_features(&[Feature::LennardJones]);
        let mut outputs = buffers();
        let err = run_on(&mut engine, &config, &mut outputs, &ProgressReporter::new()).unwrap_err();

        assert!(matches!(err, EngineError::MissingFeatures { .. }));
        assert_eq!(engine.particle_count(), 0);
        assert!(outputs.log.into_inner().is_empty());
    }

    #[test]
    fn trajectory_is_skipped_when_disabled() {
        let mut config = small_config();
        config.production.write_trajectory = false;
        let mut outputs = buffers();
        run(&config, &mut outputs, &ProgressReporter::new()).unwrap();
        assert_eq!(outputs.trajectory.unwrap().frames(), 0);
    }
}
