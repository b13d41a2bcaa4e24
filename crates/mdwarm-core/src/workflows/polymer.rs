use super::production::run_production;
use super::{RunSummary, log_warmup};
use crate::core::forcefield::params::{BondedPotential, NonBondedPotential};
use crate::core::io::RunOutputs;
use crate::core::io::observables::GyrationObservables;
use crate::core::models::ids::{ParticleId, ParticleType};
use crate::core::models::particle::NewParticle;
use crate::core::models::simulation_box::SimulationBox;
use crate::core::placement::linear_polymer_positions;
use crate::engine::config::PolymerConfig;
use crate::engine::error::EngineError;
use crate::engine::features::{Feature, require_features};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::reference::ReferenceEngine;
use crate::engine::simulation::SystemEngine;
use crate::engine::warmup::run_warmup;
use std::io::Write;
use tracing::{debug, info, instrument};

/// Chain-averaged shape of all polymers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainShape {
    pub rg: f64,
    pub rg_squared: f64,
    pub asphericity: f64,
}

/// Averages the radius of gyration, its square and the asphericity over `n_polymers`
/// consecutive chains of `beads_per_chain` particles.
pub fn chain_shape<E: SystemEngine + ?Sized>(
    engine: &E,
    n_polymers: usize,
    beads_per_chain: usize,
) -> Result<ChainShape, EngineError> {
    let mut sum = ChainShape {
        rg: 0.0,
        rg_squared: 0.0,
        asphericity: 0.0,
    };
    for chain in 0..n_polymers {
        let tensor = engine.gyration_tensor(chain * beads_per_chain, beads_per_chain)?;
        sum.rg += tensor.radius_of_gyration();
        sum.rg_squared += tensor.rg_squared();
        sum.asphericity += tensor.asphericity();
    }
    let n = n_polymers.max(1) as f64;
    Ok(ChainShape {
        rg: sum.rg / n,
        rg_squared: sum.rg_squared / n,
        asphericity: sum.asphericity / n,
    })
}

/// Runs the polymer system on a fresh [`ReferenceEngine`] sized from `config`.
#[instrument(skip_all, name = "polymer_workflow")]
pub fn run<W: Write>(
    config: &PolymerConfig,
    outputs: &mut RunOutputs<W>,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    config.validate()?;
    let sim_box = SimulationBox::cubic(config.box_length)?;
    let mut engine = ReferenceEngine::new(sim_box, config.time_step)?;
    run_on(&mut engine, config, outputs, reporter)
}

/// Runs the polymer system on `engine`.
///
/// Chains are inserted one after another, each bead bonded to the previous bead of its
/// chain, so chain `c` occupies insertion indices `c * beads_per_chain..`.
pub fn run_on<E, W>(
    engine: &mut E,
    config: &PolymerConfig,
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
            Feature::Wca,
            Feature::FeneBond,
            Feature::LangevinThermostat,
            config.warmup.rule.required_feature(),
        ],
    )?;
    config.validate()?;

    reporter.report(Progress::PhaseStart { name: "Setup" });
    info!(
        polymers = config.n_polymers,
        beads = config.beads_per_chain,
        box_l = config.box_length,
        "Setting up polymer system"
    );
    outputs.log.line(format_args!(
        "Simulate {} polymers of {} beads in a cubic box {}",
        config.n_polymers, config.beads_per_chain, config.box_length
    ))?;

    engine.set_non_bonded(
        ParticleType(0),
        ParticleType(0),
        NonBondedPotential::Wca(config.wca),
    )?;
    let fene = engine.add_bonded(BondedPotential::Fene(config.fene))?;

    let chains = linear_polymer_positions(
        config.n_polymers,
        config.beads_per_chain,
        config.bond_length,
        engine.simulation_box(),
        config.placement_seed,
    )?;
    for chain in chains {
        let mut previous: Option<ParticleId> = None;
        for position in chain {
            let mut bead = NewParticle::at(position);
            if let Some(partner) = previous {
                bead = bead.bonded_to(fene, partner);
            }
            previous = Some(engine.add_particle(bead)?);
        }
    }
    debug!(particles = engine.particle_count(), "Chains inserted");

    engine.set_thermostat(Some(config.production.thermostat))?;
    outputs.log.line(format_args!(
        "Start with minimal distance {:.6}",
        engine.min_distance()
    ))?;
    reporter.report(Progress::PhaseFinish);

    let warmup = run_warmup(engine, &config.warmup, reporter)?;
    log_warmup(outputs, &warmup, config.warmup.min_distance)?;

    if config.equilibration_steps > 0 {
        reporter.report(Progress::PhaseStart {
            name: "Equilibration",
        });
        engine.integrate(config.equilibration_steps)?;
        outputs.log.line(format_args!(
            "Equilibrated for {} steps, minimal distance {:.6}",
            config.equilibration_steps,
            engine.min_distance()
        ))?;
        reporter.report(Progress::PhaseFinish);
    }

    let (n_polymers, beads) = (config.n_polymers, config.beads_per_chain);
    let production_iterations = run_production(
        engine,
        &config.production,
        outputs,
        reporter,
        |engine, iteration, outputs| {
            let shape = chain_shape(engine, n_polymers, beads)?;
            outputs.observables.write_row(&GyrationObservables {
                iteration,
                time: engine.time(),
                rg: shape.rg,
                rg_squared: shape.rg_squared,
                asphericity: shape.asphericity,
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
