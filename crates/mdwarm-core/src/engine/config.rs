use super::features::Feature;
use super::simulation::{Langevin, SteepestDescentParams};
use crate::core::forcefield::params::{FeneParams, WcaParams};
use thiserror::Error;

/// Iteration budget applied when a warmup policy does not name one.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite and positive, got {value}")))
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be finite and non-negative, got {value}")))
    }
}

/// Maximum number of warmup bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationLimit {
    Bounded(usize),
    /// Loop until the criterion is met. Only safe when convergence is guaranteed.
    Unbounded,
}

impl IterationLimit {
    /// Whether another burst may run after `done` bursts.
    #[inline]
    pub fn allows(&self, done: usize) -> bool {
        match self {
            IterationLimit::Bounded(max) => done < *max,
            IterationLimit::Unbounded => true,
        }
    }
}

impl Default for IterationLimit {
    fn default() -> Self {
        IterationLimit::Bounded(DEFAULT_MAX_ITERATIONS)
    }
}

/// How the control parameter evolves between warmup bursts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WarmupRule {
    /// Integrate under a force cap that grows by `ramp_factor` after every unmet burst,
    /// then lift the cap and relax for `relaxation_steps`.
    ForceCapRamp {
        initial_cap: f64,
        ramp_factor: f64,
        relaxation_steps: u64,
        zero_velocities: bool,
    },
    /// Minimize the energy with a steepest-descent integrator; no ramped parameter.
    SteepestDescent(SteepestDescentParams),
}

impl WarmupRule {
    /// Engine feature the rule drives.
    pub fn required_feature(&self) -> Feature {
        match self {
            WarmupRule::ForceCapRamp { .. } => Feature::ForceCap,
            WarmupRule::SteepestDescent(_) => Feature::SteepestDescent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmupPolicy {
    /// Convergence threshold on the minimum pairwise distance.
    pub min_distance: f64,
    pub steps_per_iteration: u64,
    pub max_iterations: IterationLimit,
    pub rule: WarmupRule,
}

impl WarmupPolicy {
    pub fn builder() -> WarmupPolicyBuilder {
        WarmupPolicyBuilder::new()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("min_distance", self.min_distance)?;
        if self.steps_per_iteration == 0 {
            return Err(invalid("steps_per_iteration", "must be at least 1"));
        }
        match self.rule {
            WarmupRule::ForceCapRamp {
                initial_cap,
                ramp_factor,
                ..
            } => {
                require_positive("initial_cap", initial_cap)?;
                if !(ramp_factor.is_finite() && ramp_factor > 1.0) {
                    return Err(invalid(
                        "ramp_factor",
                        format!("must be finite and greater than 1, got {ramp_factor}"),
                    ));
                }
            }
            WarmupRule::SteepestDescent(params) => {
                require_non_negative("f_max", params.f_max)?;
                require_positive("gamma", params.gamma)?;
                require_positive("max_displacement", params.max_displacement)?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct WarmupPolicyBuilder {
    min_distance: Option<f64>,
    steps_per_iteration: Option<u64>,
    max_iterations: Option<IterationLimit>,
    force_cap: Option<(f64, f64)>,
    relaxation_steps: Option<u64>,
    zero_velocities: Option<bool>,
    steepest_descent: Option<SteepestDescentParams>,
}

impl WarmupPolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_distance(mut self, threshold: f64) -> Self {
        self.min_distance = Some(threshold);
        self
    }
    pub fn steps_per_iteration(mut self, steps: u64) -> Self {
        self.steps_per_iteration = Some(steps);
        self
    }
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(IterationLimit::Bounded(max));
        self
    }
    pub fn unbounded(mut self) -> Self {
        self.max_iterations = Some(IterationLimit::Unbounded);
        self
    }
    pub fn force_cap_ramp(mut self, initial_cap: f64, ramp_factor: f64) -> Self {
        self.force_cap = Some((initial_cap, ramp_factor));
        self
    }
    pub fn relaxation_steps(mut self, steps: u64) -> Self {
        self.relaxation_steps = Some(steps);
        self
    }
    pub fn zero_velocities(mut self, zero: bool) -> Self {
        self.zero_velocities = Some(zero);
        self
    }
    pub fn steepest_descent(mut self, params: SteepestDescentParams) -> Self {
        self.steepest_descent = Some(params);
        self
    }

    /// Builds and validates the policy.
    ///
    /// Without an explicit relaxation length the force-cap rule relaxes for ten bursts'
    /// worth of steps. Velocities are zeroed after every capped burst unless disabled.
    pub fn build(self) -> Result<WarmupPolicy, ConfigError> {
        let min_distance = self
            .min_distance
            .ok_or(ConfigError::MissingParameter("min_distance"))?;
        let steps_per_iteration = self
            .steps_per_iteration
            .ok_or(ConfigError::MissingParameter("steps_per_iteration"))?;

        let rule = match (self.force_cap, self.steepest_descent) {
            (Some((initial_cap, ramp_factor)), None) => WarmupRule::ForceCapRamp {
                initial_cap,
                ramp_factor,
                relaxation_steps: self
                    .relaxation_steps
                    .unwrap_or(steps_per_iteration.saturating_mul(10)),
                zero_velocities: self.zero_velocities.unwrap_or(true),
            },
            (None, Some(params)) => WarmupRule::SteepestDescent(params),
            (None, None) => return Err(ConfigError::MissingParameter("rule")),
            (Some(_), Some(_)) => {
                return Err(invalid(
                    "rule",
                    "a policy uses either a force-cap ramp or steepest descent, not both",
                ));
            }
        };

        let policy = WarmupPolicy {
            min_distance,
            steps_per_iteration,
            max_iterations: self.max_iterations.unwrap_or_default(),
            rule,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Parameters of the production phase shared by all workflows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionConfig {
    pub iterations: usize,
    pub steps_per_iteration: u64,
    pub thermostat: Langevin,
    pub write_trajectory: bool,
}

impl ProductionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_iteration == 0 {
            return Err(invalid("production.steps_per_iteration", "must be at least 1"));
        }
        require_non_negative("production.kt", self.thermostat.kt)?;
        require_non_negative("production.gamma", self.thermostat.gamma)
    }
}

/// Integer scale factors of the Lennard-Jones fluid run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scales {
    pub particles: i64,
    pub density: i64,
    pub temperature: i64,
}

impl Default for Scales {
    fn default() -> Self {
        Self {
            particles: 1,
            density: 1,
            temperature: 1,
        }
    }
}

/// Lennard-Jones (argon-like) fluid in a cubic box.
#[derive(Debug, Clone, PartialEq)]
pub struct LjLiquidConfig {
    pub scales: Scales,
    pub base_particles: usize,
    /// Particles per Å³ at density scale 100.
    pub base_density: f64,
    /// Kelvin at temperature scale 0.
    pub base_temperature: f64,
    /// Well depth in Kelvin; divided by the temperature to get kT units.
    pub epsilon_kelvin: f64,
    /// Å.
    pub sigma: f64,
    /// Cutoff in units of `sigma`.
    pub cutoff_factor: f64,
    pub time_step: f64,
    pub placement_seed: u64,
    pub warmup: WarmupPolicy,
    pub production: ProductionConfig,
}

impl LjLiquidConfig {
    /// `None` when the scaled count does not fit in `usize`.
    pub fn checked_particle_count(&self) -> Option<usize> {
        let scale = usize::try_from(self.scales.particles.max(0)).ok()?;
        self.base_particles.checked_mul(scale)
    }

    pub fn particle_count(&self) -> usize {
        self.checked_particle_count().unwrap_or(usize::MAX)
    }

    pub fn density(&self) -> f64 {
        self.base_density * (self.scales.density as f64 * 0.01)
    }

    pub fn box_length(&self) -> f64 {
        (self.particle_count() as f64 / self.density()).cbrt()
    }

    pub fn temperature(&self) -> f64 {
        self.base_temperature * (1.0 + self.scales.temperature as f64 * 0.1)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon_kelvin / self.temperature()
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff_factor * self.sigma
    }

    /// Steepest-descent warmup: ten bursts of 20 steps until particles are 0.9 σ apart.
    pub fn default_warmup(sigma: f64) -> WarmupPolicy {
        WarmupPolicy {
            min_distance: 0.9 * sigma,
            steps_per_iteration: 20,
            max_iterations: IterationLimit::Bounded(10),
            rule: WarmupRule::SteepestDescent(SteepestDescentParams {
                f_max: 0.0,
                gamma: 1e-3,
                max_displacement: sigma / 100.0,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scales.particles < 1 {
            return Err(invalid("scales.particles", "must be at least 1"));
        }
        if self.scales.density < 1 {
            return Err(invalid("scales.density", "must be at least 1"));
        }
        match self.checked_particle_count() {
            None => {
                return Err(invalid(
                    "scales.particles",
                    format!(
                        "{} x {} particles overflows",
                        self.base_particles, self.scales.particles
                    ),
                ));
            }
            Some(0) => return Err(invalid("base_particles", "must be at least 1")),
            Some(_) => {}
        }
        require_positive("base_density", self.base_density)?;
        require_positive("temperature", self.temperature())?;
        require_non_negative("epsilon_kelvin", self.epsilon_kelvin)?;
        require_positive("sigma", self.sigma)?;
        require_positive("cutoff_factor", self.cutoff_factor)?;
        require_positive("time_step", self.time_step)?;
        self.warmup.validate()?;
        self.production.validate()
    }
}

impl Default for LjLiquidConfig {
    fn default() -> Self {
        let sigma = 3.4;
        Self {
            scales: Scales::default(),
            base_particles: 512,
            base_density: 4.8e-5,
            base_temperature: 300.0,
            epsilon_kelvin: 125.0,
            sigma,
            cutoff_factor: 2.5,
            time_step: 0.01,
            placement_seed: 42,
            warmup: Self::default_warmup(sigma),
            production: ProductionConfig {
                iterations: 1000,
                steps_per_iteration: 1000,
                thermostat: Langevin {
                    kt: 1.0,
                    gamma: 1.0,
                    seed: 42,
                },
                write_trajectory: true,
            },
        }
    }
}

/// Overlap-removal strategy of the polymer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmupStrategy {
    #[default]
    ForceCap,
    SteepestDescent,
}

/// Bead-spring polymer chains with WCA beads and FENE bonds.
#[derive(Debug, Clone, PartialEq)]
pub struct PolymerConfig {
    pub n_polymers: usize,
    pub beads_per_chain: usize,
    pub box_length: f64,
    pub wca: WcaParams,
    pub fene: FeneParams,
    pub bond_length: f64,
    pub placement_seed: u64,
    pub time_step: f64,
    pub warmup: WarmupPolicy,
    /// Steps run at the production temperature between warmup and production.
    pub equilibration_steps: u64,
    pub production: ProductionConfig,
}

impl PolymerConfig {
    pub fn default_warmup(strategy: WarmupStrategy) -> WarmupPolicy {
        match strategy {
            WarmupStrategy::ForceCap => WarmupPolicy {
                min_distance: 0.95,
                steps_per_iteration: 10,
                max_iterations: IterationLimit::default(),
                rule: WarmupRule::ForceCapRamp {
                    initial_cap: 1.0,
                    ramp_factor: 1.01,
                    relaxation_steps: 100,
                    zero_velocities: true,
                },
            },
            WarmupStrategy::SteepestDescent => WarmupPolicy {
                min_distance: 0.95,
                steps_per_iteration: 20,
                max_iterations: IterationLimit::default(),
                rule: WarmupRule::SteepestDescent(SteepestDescentParams {
                    f_max: 0.0,
                    gamma: 1e-3,
                    max_displacement: 0.01,
                }),
            },
        }
    }

    pub fn with_strategy(strategy: WarmupStrategy) -> Self {
        Self {
            warmup: Self::default_warmup(strategy),
            ..Self::default()
        }
    }

    pub fn particle_count(&self) -> usize {
        self.n_polymers * self.beads_per_chain
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_polymers == 0 {
            return Err(invalid("n_polymers", "must be at least 1"));
        }
        if self.beads_per_chain == 0 {
            return Err(invalid("beads_per_chain", "must be at least 1"));
        }
        require_positive("box_length", self.box_length)?;
        require_positive("bond_length", self.bond_length)?;
        if self.bond_length >= self.fene.d_r_max + self.fene.r_0 {
            return Err(invalid(
                "bond_length",
                format!(
                    "must be shorter than the FENE maximal extension {}",
                    self.fene.d_r_max + self.fene.r_0
                ),
            ));
        }
        require_positive("time_step", self.time_step)?;
        self.warmup.validate()?;
        self.production.validate()
    }
}

impl Default for PolymerConfig {
    fn default() -> Self {
        Self {
            n_polymers: 1,
            beads_per_chain: 5,
            box_length: 100.0,
            wca: WcaParams {
                epsilon: 1.0,
                sigma: 1.0,
            },
            fene: FeneParams {
                k: 10.0,
                d_r_max: 2.0,
                r_0: 0.0,
            },
            bond_length: 1.0,
            placement_seed: 3210,
            time_step: 0.01,
            warmup: Self::default_warmup(WarmupStrategy::ForceCap),
            equilibration_steps: 100,
            production: ProductionConfig {
                iterations: 1000,
                steps_per_iteration: 10,
                thermostat: Langevin {
                    kt: 1.0,
                    gamma: 1.0,
                    seed: 42,
                },
                write_trajectory: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_threshold_and_steps() {
        let err = WarmupPolicy::builder()
            .force_cap_ramp(1.0, 1.01)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("min_distance"));

        let err = WarmupPolicy::builder()
            .min_distance(0.95)
            .force_cap_ramp(1.0, 1.01)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("steps_per_iteration"));
    }

    #[test]
    fn builder_requires_exactly_one_rule() {
        let base = || WarmupPolicy::builder().min_distance(0.95).steps_per_iteration(10);
        assert_eq!(
            base().build().unwrap_err(),
            ConfigError::MissingParameter("rule")
        );
        let both = base()
            .force_cap_ramp(1.0, 1.01)
            .steepest_descent(SteepestDescentParams {
                f_max: 0.0,
                gamma: 1e-3,
                max_displacement: 0.01,
            })
            .build();
        assert!(matches!(
            both,
            Err(ConfigError::InvalidParameter { name: "rule", .. })
        ));
    }

    #[test]
    fn force_cap_relaxation_defaults_to_ten_bursts() {
        let policy = WarmupPolicy::builder()
            .min_distance(0.95)
            .steps_per_iteration(10)
            .force_cap_ramp(1.0, 1.01)
            .build()
            .unwrap();
        match policy.rule {
            WarmupRule::ForceCapRamp {
                relaxation_steps, ..
            } => assert_eq!(relaxation_steps, 100),
            _ => panic!("expected a force-cap rule"),
        }
        assert_eq!(
            policy.max_iterations,
            IterationLimit::Bounded(DEFAULT_MAX_ITERATIONS)
        );
    }

    #[test]
    fn force_cap_builder_zeroes_velocities_unless_disabled() {
        let base = || {
            WarmupPolicy::builder()
                .min_distance(0.95)
                .steps_per_iteration(10)
                .force_cap_ramp(1.0, 1.01)
        };
        let zeroes = |policy: WarmupPolicy| match policy.rule {
            WarmupRule::ForceCapRamp {
                zero_velocities, ..
            } => zero_velocities,
            _ => panic!("expected a force-cap rule"),
        };
        assert!(zeroes(base().build().unwrap()));
        assert!(!zeroes(base().zero_velocities(false).build().unwrap()));
        assert_eq!(
            base().relaxation_steps(100).build().unwrap(),
            PolymerConfig::default_warmup(WarmupStrategy::ForceCap)
        );
    }

    #[test]
    fn ramp_factor_must_exceed_one() {
        let result = WarmupPolicy::builder()
            .min_distance(0.95)
            .steps_per_iteration(10)
            .force_cap_ramp(1.0, 1.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "ramp_factor",
                ..
            })
        ));
    }

    #[test]
    fn iteration_limit_allows_until_budget_is_spent() {
        let limit = IterationLimit::Bounded(2);
        assert!(limit.allows(0));
        assert!(limit.allows(1));
        assert!(!limit.allows(2));
        assert!(IterationLimit::Unbounded.allows(usize::MAX));
    }

    #[test]
    fn lj_liquid_defaults_derive_physical_quantities() {
        let config = LjLiquidConfig::default();
        assert_eq!(config.particle_count(), 512);
        assert!((config.density() - 4.8e-7).abs() < 1e-15);
        assert!((config.temperature() - 330.0).abs() < 1e-9);
        assert!((config.epsilon() - 125.0 / 330.0).abs() < 1e-12);
        assert!((config.cutoff() - 8.5).abs() < 1e-12);
        let expected_box = (512.0f64 / 4.8e-7).cbrt();
        assert!((config.box_length() - expected_box).abs() < 1e-6);
        assert!((config.warmup.min_distance - 3.06).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn lj_liquid_rejects_zero_density_scale() {
        let config = LjLiquidConfig {
            scales: Scales {
                density: 0,
                ..Scales::default()
            },
            ..LjLiquidConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn lj_liquid_reports_overflowing_particle_scale() {
        let config = LjLiquidConfig {
            scales: Scales {
                particles: 1 << 60,
                ..Scales::default()
            },
            ..LjLiquidConfig::default()
        };
        assert_eq!(config.checked_particle_count(), None);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "scales.particles",
                ..
            })
        ));
    }

    #[test]
    fn polymer_defaults_are_valid_for_both_strategies() {
        assert!(PolymerConfig::default().validate().is_ok());
        let sd = PolymerConfig::with_strategy(WarmupStrategy::SteepestDescent);
        assert!(sd.validate().is_ok());
        assert!(matches!(sd.warmup.rule, WarmupRule::SteepestDescent(_)));
    }

    #[test]
    fn polymer_bond_length_must_fit_fene_extension() {
        let config = PolymerConfig {
            bond_length: 2.5,
            ..PolymerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter {
                name: "bond_length",
                ..
            })
        ));
    }
}
