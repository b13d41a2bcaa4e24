use super::config::{WarmupPolicy, WarmupRule};
use super::error::EngineError;
use super::features::require_features;
use super::progress::{Progress, ProgressReporter};
use super::simulation::{Integrator, Langevin, SimulationEngine};
use super::state::{ControlValue, WarmupOutcome, WarmupPhase, WarmupRecord};
use tracing::{debug, info, instrument, warn};

/// Removes initial overlaps by integrating in short bursts until no two particles are
/// closer than `policy.min_distance`, or the iteration budget is spent.
///
/// The distance criterion is checked before every burst, so an already relaxed system
/// performs no integration at all. Non-convergence is reported through
/// [`WarmupOutcome::converged`]; only engine failures are returned as errors.
///
/// On return the engine is left as it was found apart from the particle state: the force
/// cap is removed, and the thermostat and integrator are restored.
#[instrument(skip_all, name = "warmup")]
pub fn run_warmup<E>(
    engine: &mut E,
    policy: &WarmupPolicy,
    reporter: &ProgressReporter,
) -> Result<WarmupOutcome, EngineError>
where
    E: SimulationEngine + ?Sized,
{
    policy.validate()?;
    require_features(&*engine, &[policy.rule.required_feature()])?;

    info!(
        threshold = policy.min_distance,
        steps = policy.steps_per_iteration,
        limit = ?policy.max_iterations,
        "Starting warmup"
    );
    reporter.report(Progress::PhaseStart { name: "Warmup" });
    let outcome = WarmupController::new(engine, policy).run(reporter);
    reporter.report(Progress::PhaseFinish);
    outcome
}

/// Engine settings replaced while warming, restored before handing over.
#[derive(Debug, Clone, Copy)]
enum Saved {
    Thermostat(Option<Langevin>),
    Integrator(Integrator),
}

struct WarmupController<'a, E: ?Sized> {
    engine: &'a mut E,
    policy: &'a WarmupPolicy,
    phase: WarmupPhase,
    control: ControlValue,
    saved: Option<Saved>,
    iterations: usize,
    integration_steps: u64,
    records: Vec<WarmupRecord>,
}

impl<'a, E: SimulationEngine + ?Sized> WarmupController<'a, E> {
    fn new(engine: &'a mut E, policy: &'a WarmupPolicy) -> Self {
        Self {
            engine,
            policy,
            phase: WarmupPhase::Warming,
            control: ControlValue::None,
            saved: None,
            iterations: 0,
            integration_steps: 0,
            records: Vec::new(),
        }
    }

    fn run(mut self, reporter: &ProgressReporter) -> Result<WarmupOutcome, EngineError> {
        let converged = self.warm(reporter)?;
        if matches!(self.saved, Some(Saved::Thermostat(_))) {
            self.relax(reporter)?;
        }
        self.finish(converged)
    }

    /// WARMING: burst, update the control parameter, repeat. Returns whether the distance
    /// criterion was met.
    fn warm(&mut self, reporter: &ProgressReporter) -> Result<bool, EngineError> {
        loop {
            let min_distance = self.engine.min_distance();
            if min_distance >= self.policy.min_distance {
                debug!(
                    iterations = self.iterations,
                    min_distance, "Distance criterion met"
                );
                return Ok(true);
            }
            if !self.policy.max_iterations.allows(self.iterations) {
                return Ok(false);
            }
            if self.saved.is_none() {
                self.engage()?;
            }

            let record = WarmupRecord {
                iteration: self.iterations,
                min_distance,
                control: self.control,
                total_energy: self.engine.energy()?.total(),
            };
            debug!(%record, "Warmup burst");
            reporter.report(Progress::Warmup(record));
            self.records.push(record);

            self.integration_steps += self.engine.integrate(self.policy.steps_per_iteration)?;
            self.iterations += 1;
            self.update_control()?;
            self.transition(WarmupPhase::Warming)?;
        }
    }

    /// Applies the rule's control parameter to the engine before the first burst.
    fn engage(&mut self) -> Result<(), EngineError> {
        match self.policy.rule {
            WarmupRule::ForceCapRamp { initial_cap, .. } => {
                let thermostat = self.engine.thermostat();
                if let Some(settings) = thermostat {
                    self.engine.set_thermostat(Some(settings.with_kt(0.0)))?;
                }
                self.engine.set_force_cap(Some(initial_cap))?;
                self.control = ControlValue::ForceCap(initial_cap);
                self.saved = Some(Saved::Thermostat(thermostat));
            }
            WarmupRule::SteepestDescent(params) => {
                let previous = self.engine.integrator();
                self.engine
                    .set_integrator(Integrator::SteepestDescent(params))?;
                self.saved = Some(Saved::Integrator(previous));
            }
        }
        Ok(())
    }

    fn update_control(&mut self) -> Result<(), EngineError> {
        if let WarmupRule::ForceCapRamp {
            ramp_factor,
            zero_velocities,
            ..
        } = self.policy.rule
        {
            if zero_velocities {
                self.engine.zero_velocities();
            }
            if let ControlValue::ForceCap(cap) = self.control {
                let next = cap * ramp_factor;
                self.engine.set_force_cap(Some(next))?;
                self.control = ControlValue::ForceCap(next);
            }
        }
        Ok(())
    }

    /// RELAXING: lift the cap, run the fixed relaxation, then bring the thermostat back
    /// to its target temperature.
    fn relax(&mut self, reporter: &ProgressReporter) -> Result<(), EngineError> {
        self.transition(WarmupPhase::Relaxing)?;
        let WarmupRule::ForceCapRamp {
            relaxation_steps, ..
        } = self.policy.rule
        else {
            return Err(EngineError::Internal(
                "relaxation requires a force-cap rule".to_string(),
            ));
        };

        self.engine.set_force_cap(None)?;
        self.control = ControlValue::None;
        reporter.message(format!("Relaxing for {relaxation_steps} steps without force cap"));
        self.integration_steps += self.engine.integrate(relaxation_steps)?;

        if let Some(Saved::Thermostat(thermostat)) = self.saved.take() {
            self.engine.set_thermostat(thermostat)?;
        }
        Ok(())
    }

    /// READY: restore anything still replaced and report the outcome.
    fn finish(mut self, converged: bool) -> Result<WarmupOutcome, EngineError> {
        match self.saved.take() {
            Some(Saved::Integrator(previous)) => self.engine.set_integrator(previous)?,
            Some(Saved::Thermostat(thermostat)) => {
                self.engine.set_force_cap(None)?;
                self.engine.set_thermostat(thermostat)?;
            }
            None => {}
        }
        self.transition(WarmupPhase::Ready)?;

        let final_min_distance = self.engine.min_distance();
        if converged {
            info!(
                iterations = self.iterations,
                steps = self.integration_steps,
                min_distance = final_min_distance,
                "Warmup converged"
            );
        } else {
            warn!(
                iterations = self.iterations,
                min_distance = final_min_distance,
                threshold = self.policy.min_distance,
                "Warmup budget exhausted before the distance criterion was met"
            );
        }

        Ok(WarmupOutcome {
            converged,
            iterations: self.iterations,
            integration_steps: self.integration_steps,
            final_min_distance,
            final_phase: self.phase,
            records: self.records,
        })
    }

    fn transition(&mut self, next: WarmupPhase) -> Result<(), EngineError> {
        if !self.phase.can_transition_to(next) {
            return Err(EngineError::PhaseTransition {
                from: self.phase,
                to: next,
            });
        }
        if self.phase != next {
            debug!(from = %self.phase, to = %next, "Warmup phase transition");
        }
        self.phase = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::EnergyReport;
    use crate::core::forcefield::params::{NonBondedPotential, WcaParams};
    use crate::core::models::ids::ParticleType;
    use crate::core::models::particle::NewParticle;
    use crate::core::models::simulation_box::SimulationBox;
    use crate::engine::config::IterationLimit;
    use crate::engine::features::Feature;
    use crate::engine::reference::ReferenceEngine;
    use crate::engine::simulation::{SteepestDescentParams, SystemEngine};
    use nalgebra::Point3;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Burst {
        steps: u64,
        cap: Option<f64>,
        integrator: Integrator,
        kt: Option<f64>,
    }

    /// Engine whose minimum distance follows a script indexed by the number of bursts run.
    struct ScriptedEngine {
        distances: Vec<f64>,
        missing: Vec<Feature>,
        force_cap: Option<f64>,
        cap_history: Vec<Option<f64>>,
        thermostat: Option<Langevin>,
        integrator: Integrator,
        bursts: Vec<Burst>,
        zeroed: usize,
    }

    impl ScriptedEngine {
        fn new(distances: &[f64]) -> Self {
            Self {
                distances: distances.to_vec(),
                missing: Vec::new(),
                force_cap: None,
                cap_history: Vec::new(),
                thermostat: None,
                integrator: Integrator::VelocityVerlet,
                bursts: Vec::new(),
                zeroed: 0,
            }
        }

        fn capped_bursts(&self) -> usize {
            self.bursts.iter().filter(|b| b.cap.is_some()).count()
        }
    }

    impl SimulationEngine for ScriptedEngine {
        fn supports(&self, feature: Feature) -> bool {
            !self.missing.contains(&feature)
        }
        fn min_distance(&self) -> f64 {
            let index = self.bursts.len().min(self.distances.len() - 1);
            self.distances[index]
        }
        fn energy(&self) -> Result<EnergyReport, EngineError> {
            Ok(EnergyReport::default())
        }
        fn force_cap(&self) -> Option<f64> {
            self.force_cap
        }
        fn set_force_cap(&mut self, cap: Option<f64>) -> Result<(), EngineError> {
            self.force_cap = cap;
            self.cap_history.push(cap);
            Ok(())
        }
        fn thermostat(&self) -> Option<Langevin> {
            self.thermostat
        }
        fn set_thermostat(&mut self, thermostat: Option<Langevin>) -> Result<(), EngineError> {
            self.thermostat = thermostat;
            Ok(())
        }
        fn integrator(&self) -> Integrator {
            self.integrator
        }
        fn set_integrator(&mut self, integrator: Integrator) -> Result<(), EngineError> {
            self.integrator = integrator;
            Ok(())
        }
        fn integrate(&mut self, steps: u64) -> Result<u64, EngineError> {
            self.bursts.push(Burst {
                steps,
                cap: self.force_cap,
                integrator: self.integrator,
                kt: self.thermostat.map(|t| t.kt),
            });
            Ok(steps)
        }
        fn zero_velocities(&mut self) {
            self.zeroed += 1;
        }
        fn time(&self) -> f64 {
            0.0
        }
    }

    fn force_cap_policy(max_iterations: usize) -> WarmupPolicy {
        WarmupPolicy::builder()
            .min_distance(0.95)
            .steps_per_iteration(10)
            .max_iterations(max_iterations)
            .force_cap_ramp(1.0, 1.01)
            .build()
            .unwrap()
    }

    fn descent_policy(max_iterations: usize) -> WarmupPolicy {
        WarmupPolicy::builder()
            .min_distance(0.95)
            .steps_per_iteration(20)
            .max_iterations(max_iterations)
            .steepest_descent(SD)
            .build()
            .unwrap()
    }

    const SD: SteepestDescentParams = SteepestDescentParams {
        f_max: 0.0,
        gamma: 1e-3,
        max_displacement: 0.01,
    };

    #[test]
    fn force_cap_ramps_geometrically_then_relaxes_without_cap() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.6, 0.7, 0.8, 0.9, 1.0]);
        let outcome =
            run_warmup(&mut engine, &force_cap_policy(1000), &ProgressReporter::new()).unwrap();

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 5);
        assert_eq!(outcome.final_phase, WarmupPhase::Ready);
        assert_eq!(outcome.integration_steps, 5 * 10 + 100);

        let caps: Vec<f64> = engine.cap_history.iter().flatten().copied().collect();
        assert_eq!(caps.len(), 6);
        for (i, cap) in caps.iter().enumerate() {
            assert!((cap - 1.01f64.powi(i as i32)).abs() < 1e-12);
        }
        assert!((caps[5] - 1.051_010_050_1).abs() < 1e-9);
        assert!(caps.windows(2).all(|w| w[1] > w[0]));

        let relaxation = engine.bursts.last().unwrap();
        assert_eq!(relaxation.steps, 100);
        assert_eq!(relaxation.cap, None);
        assert_eq!(engine.force_cap, None);
    }

    #[test]
    fn records_carry_the_cap_used_for_each_burst() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.5, 0.5, 1.0]);
        let outcome =
            run_warmup(&mut engine, &force_cap_policy(1000), &ProgressReporter::new()).unwrap();
        let controls: Vec<_> = outcome.records.iter().map(|r| r.control).collect();
        assert_eq!(
            controls,
            vec![
                ControlValue::ForceCap(1.0),
                ControlValue::ForceCap(1.01),
                ControlValue::ForceCap(1.01 * 1.01),
            ]
        );
        assert_eq!(
            outcome.records.iter().map(|r| r.iteration).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(outcome.records[0].min_distance, 0.5);
    }

    #[test]
    fn exhausted_budget_reports_non_convergence_after_exact_burst_count() {
        let mut engine = ScriptedEngine::new(&[0.1]);
        let outcome =
            run_warmup(&mut engine, &descent_policy(10), &ProgressReporter::new()).unwrap();

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 10);
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(engine.bursts.len(), 10);
        assert!(engine.bursts.iter().all(|b| b.steps == 20));
        assert_eq!(outcome.final_phase, WarmupPhase::Ready);
        assert_eq!(outcome.final_min_distance, 0.1);
    }

    #[test]
    fn exhausted_force_cap_budget_still_lifts_the_cap() {
        let mut engine = ScriptedEngine::new(&[0.1]);
        let outcome =
            run_warmup(&mut engine, &force_cap_policy(10), &ProgressReporter::new()).unwrap();

        assert!(!outcome.converged);
        assert_eq!(outcome.records.len(), 10);
        assert_eq!(engine.capped_bursts(), 10);
        assert!(
            engine
                .bursts
                .iter()
                .filter(|b| b.cap.is_some())
                .all(|b| b.steps == 10)
        );
        assert_eq!(engine.bursts.len(), 11);
        assert_eq!(engine.force_cap, None);
        assert_eq!(outcome.final_phase, WarmupPhase::Ready);
    }

    #[test]
    fn criterion_is_checked_before_the_first_burst() {
        let mut engine = ScriptedEngine::new(&[2.0]);
        let outcome =
            run_warmup(&mut engine, &descent_policy(10), &ProgressReporter::new()).unwrap();

        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.integration_steps, 0);
        assert!(outcome.records.is_empty());
        assert!(engine.bursts.is_empty());
        assert_eq!(engine.integrator, Integrator::VelocityVerlet);
    }

    #[test]
    fn warmup_on_relaxed_system_is_idempotent() {
        let mut engine = ScriptedEngine::new(&[1.2]);
        let policy = force_cap_policy(1000);
        for _ in 0..2 {
            let outcome = run_warmup(&mut engine, &policy, &ProgressReporter::new()).unwrap();
            assert!(outcome.converged);
            assert_eq!(outcome.integration_steps, 0);
            assert_eq!(outcome.final_phase, WarmupPhase::Ready);
        }
        assert!(engine.bursts.is_empty());
        assert!(engine.cap_history.is_empty());
    }

    #[test]
    fn steepest_descent_runs_under_minimizer_and_restores_integrator() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.97]);
        let outcome =
            run_warmup(&mut engine, &descent_policy(10), &ProgressReporter::new()).unwrap();

        assert!(outcome.converged);
        assert_eq!(engine.bursts.len(), 1);
        assert_eq!(engine.bursts[0].integrator, Integrator::SteepestDescent(SD));
        assert_eq!(outcome.records[0].control, ControlValue::None);
        assert_eq!(engine.integrator, Integrator::VelocityVerlet);
        assert!(engine.cap_history.is_empty());
    }

    #[test]
    fn thermostat_is_cold_while_capped_and_restored_afterwards() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.5, 1.0]);
        let production = Langevin {
            kt: 1.0,
            gamma: 1.0,
            seed: 42,
        };
        engine.thermostat = Some(production);
        run_warmup(&mut engine, &force_cap_policy(1000), &ProgressReporter::new()).unwrap();

        assert!(engine.bursts.iter().all(|b| b.kt == Some(0.0)));
        assert_eq!(engine.thermostat, Some(production));
    }

    #[test]
    fn velocities_are_zeroed_after_each_capped_burst() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.5, 0.5, 1.0]);
        run_warmup(&mut engine, &force_cap_policy(1000), &ProgressReporter::new()).unwrap();
        assert_eq!(engine.zeroed, 3);
    }

    #[test]
    fn velocities_are_kept_when_zeroing_is_disabled() {
        let mut engine = ScriptedEngine::new(&[0.5, 0.5, 0.5, 1.0]);
        let policy = WarmupPolicy::builder()
            .min_distance(0.95)
            .steps_per_iteration(10)
            .force_cap_ramp(1.0, 1.01)
            .zero_velocities(false)
            .build()
            .unwrap();
        run_warmup(&mut engine, &policy, &ProgressReporter::new()).unwrap();
        assert_eq!(engine.zeroed, 0);
    }

    #[test]
    fn unbounded_policy_runs_until_the_criterion_is_met() {
        let mut engine = ScriptedEngine::new(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.96]);
        let mut policy = descent_policy(1);
        policy.max_iterations = IterationLimit::Unbounded;
        let outcome = run_warmup(&mut engine, &policy, &ProgressReporter::new()).unwrap();
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 7);
    }

    #[test]
    fn missing_feature_is_rejected_before_touching_the_engine() {
        let mut engine = ScriptedEngine::new(&[0.1]);
        engine.missing.push(Feature::ForceCap);
        let err =
            run_warmup(&mut engine, &force_cap_policy(10), &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::MissingFeatures { .. }));
        assert!(engine.bursts.is_empty());
    }

    #[test]
    fn every_burst_emits_one_progress_record() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            if let Progress::Warmup(record) = event {
                sink.lock().unwrap().push(record.iteration);
            }
        }));
        let mut engine = ScriptedEngine::new(&[0.1]);
        run_warmup(&mut engine, &descent_policy(10), &reporter).unwrap();
        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn reference_engine_pair_is_pushed_apart_under_force_cap() {
        let mut engine =
            ReferenceEngine::new(SimulationBox::cubic(10.0).unwrap(), 0.01).unwrap();
        engine
            .set_non_bonded(
                ParticleType(0),
                ParticleType(0),
                NonBondedPotential::Wca(WcaParams {
                    epsilon: 1.0,
                    sigma: 1.0,
                }),
            )
            .unwrap();
        engine
            .add_particle(NewParticle::at(Point3::new(5.0, 5.0, 5.0)))
            .unwrap();
        engine
            .add_particle(NewParticle::at(Point3::new(5.5, 5.0, 5.0)))
            .unwrap();

        let outcome =
            run_warmup(&mut engine, &force_cap_policy(1000), &ProgressReporter::new()).unwrap();
        assert!(outcome.converged);
        assert!(outcome.iterations > 0);
        assert!(engine.min_distance() >= 0.95);
        assert_eq!(engine.force_cap(), None);
    }
}
