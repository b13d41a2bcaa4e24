use crate::cli::{LjLiquidArgs, PolymerArgs, ProductionArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use mdwarm::engine::config::{
    IterationLimit, LjLiquidConfig, PolymerConfig, ProductionConfig, Scales, WarmupPolicy,
    WarmupRule, WarmupStrategy,
};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
enum FileWarmupStrategy {
    ForceCap,
    SteepestDescent,
}

impl From<FileWarmupStrategy> for WarmupStrategy {
    fn from(s: FileWarmupStrategy) -> Self {
        match s {
            FileWarmupStrategy::ForceCap => WarmupStrategy::ForceCap,
            FileWarmupStrategy::SteepestDescent => WarmupStrategy::SteepestDescent,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSystemConfig {
    time_step: Option<f64>,
    placement_seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialWarmupConfig {
    strategy: Option<FileWarmupStrategy>,
    min_distance: Option<f64>,
    steps_per_iteration: Option<u64>,
    max_iterations: Option<usize>,
    unbounded: Option<bool>,
    // force-cap ramp
    initial_cap: Option<f64>,
    ramp_factor: Option<f64>,
    relaxation_steps: Option<u64>,
    zero_velocities: Option<bool>,
    // steepest descent
    f_max: Option<f64>,
    gamma: Option<f64>,
    max_displacement: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialProductionConfig {
    iterations: Option<usize>,
    steps_per_iteration: Option<u64>,
    kt: Option<f64>,
    gamma: Option<f64>,
    seed: Option<u64>,
    write_trajectory: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialLjLiquidConfig {
    particle_scale: Option<i64>,
    density_scale: Option<i64>,
    temperature_scale: Option<i64>,
    base_particles: Option<usize>,
    epsilon_kelvin: Option<f64>,
    sigma: Option<f64>,
    cutoff_factor: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPolymerConfig {
    n_polymers: Option<usize>,
    n_beads_per_chain: Option<usize>,
    box_l: Option<f64>,
    bond_length: Option<f64>,
    equilibration_steps: Option<u64>,
    fene_k: Option<f64>,
    fene_d_r_max: Option<f64>,
}

/// Run settings read from a TOML file and `--set` overrides, all optional.
///
/// Precedence when merging: command-line flag, then `--set`, then the file, then the
/// built-in defaults of the workflow.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialRunConfig {
    system: Option<PartialSystemConfig>,
    warmup: Option<PartialWarmupConfig>,
    production: Option<PartialProductionConfig>,
    lj_liquid: Option<PartialLjLiquidConfig>,
    polymer: Option<PartialPolymerConfig>,
}

impl PartialRunConfig {
    /// Loads the optional config file and applies `set_values` on top of it.
    pub fn load(path: Option<&Path>, set_values: &[String]) -> Result<Self> {
        let mut table = match path {
            Some(path) => {
                debug!("Loading configuration from file: {:?}", path);
                let content = std::fs::read_to_string(path)?;
                toml::from_str::<toml::Table>(&content).map_err(|e| CliError::FileParsing {
                    path: path.to_path_buf(),
                    source: e.into(),
                })?
            }
            None => toml::Table::new(),
        };
        Self::apply_set_values(&mut table, set_values)?;
        toml::Value::Table(table)
            .try_into()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(table: &mut toml::Table, set_values: &[String]) -> Result<()> {
        for assignment in set_values {
            let (section, key, raw) = parser::parse_assignment(assignment)?;
            let value = parse_toml_value(raw);
            debug!("Overriding {}.{} = {}", section, key, value);
            let section_table = table
                .entry(section.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            let toml::Value::Table(section_table) = section_table else {
                return Err(CliError::Config(format!(
                    "Cannot set '{section}.{key}': '{section}' is not a table"
                )));
            };
            section_table.insert(key.to_string(), value);
        }
        Ok(())
    }

    pub fn merge_lj_liquid(mut self, args: &LjLiquidArgs) -> Result<LjLiquidConfig> {
        let mut config = LjLiquidConfig::default();

        let system = self.system.take().unwrap_or_default();
        merge_system(&mut config.time_step, &mut config.placement_seed, &system);

        let lj = self.lj_liquid.take().unwrap_or_default();
        let file_scales = Scales {
            particles: lj.particle_scale.unwrap_or(config.scales.particles),
            density: lj.density_scale.unwrap_or(config.scales.density),
            temperature: lj.temperature_scale.unwrap_or(config.scales.temperature),
        };
        config.scales = parser::parse_scales(&args.scales, file_scales)?;
        if let Some(v) = lj.base_particles {
            config.base_particles = v;
        }
        if let Some(v) = lj.epsilon_kelvin {
            config.epsilon_kelvin = v;
        }
        if let Some(v) = lj.cutoff_factor {
            config.cutoff_factor = v;
        }
        if let Some(sigma) = lj.sigma {
            config.sigma = sigma;
            config.warmup = LjLiquidConfig::default_warmup(sigma);
        }

        let warmup = self.warmup.take().unwrap_or_default();
        if warmup.strategy == Some(FileWarmupStrategy::ForceCap) {
            return Err(CliError::Config(
                "The Lennard-Jones fluid only supports the steepest-descent warmup.".to_string(),
            ));
        }
        config.warmup = merge_warmup(config.warmup, &warmup)?;

        let production = self.production.take().unwrap_or_default();
        merge_production(&mut config.production, &production, &args.production);
        if args.no_trajectory {
            config.production.write_trajectory = false;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn merge_polymer(mut self, args: &PolymerArgs) -> Result<PolymerConfig> {
        let warmup = self.warmup.take().unwrap_or_default();
        let strategy = args
            .warmup
            .map(WarmupStrategy::from)
            .or(warmup.strategy.map(WarmupStrategy::from))
            .unwrap_or_default();
        let mut config = PolymerConfig::with_strategy(strategy);

        let system = self.system.take().unwrap_or_default();
        merge_system(&mut config.time_step, &mut config.placement_seed, &system);

        let polymer = self.polymer.take().unwrap_or_default();
        config.n_polymers = args
            .n_polymers
            .or(polymer.n_polymers)
            .unwrap_or(config.n_polymers);
        config.beads_per_chain = args
            .n_beads_per_chain
            .or(polymer.n_beads_per_chain)
            .unwrap_or(config.beads_per_chain);
        config.box_length = args.box_l.or(polymer.box_l).unwrap_or(config.box_length);
        if let Some(v) = polymer.bond_length {
            config.bond_length = v;
        }
        if let Some(v) = polymer.equilibration_steps {
            config.equilibration_steps = v;
        }
        if let Some(v) = polymer.fene_k {
            config.fene.k = v;
        }
        if let Some(v) = polymer.fene_d_r_max {
            config.fene.d_r_max = v;
        }

        config.warmup = merge_warmup(config.warmup, &warmup)?;

        let production = self.production.take().unwrap_or_default();
        merge_production(&mut config.production, &production, &args.production);
        if args.trajectory {
            config.production.write_trajectory = true;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parses a `--set` value as a TOML literal, falling back to a bare string.
fn parse_toml_value(raw: &str) -> toml::Value {
    toml::from_str::<toml::Table>(&format!("value = {raw}"))
        .ok()
        .and_then(|mut t| t.remove("value"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()))
}

fn merge_system(time_step: &mut f64, placement_seed: &mut u64, partial: &PartialSystemConfig) {
    if let Some(v) = partial.time_step {
        *time_step = v;
    }
    if let Some(v) = partial.placement_seed {
        *placement_seed = v;
    }
}

fn merge_production(
    config: &mut ProductionConfig,
    partial: &PartialProductionConfig,
    cli: &ProductionArgs,
) {
    config.iterations = cli
        .iterations
        .or(partial.iterations)
        .unwrap_or(config.iterations);
    config.steps_per_iteration = cli
        .steps_per_iteration
        .or(partial.steps_per_iteration)
        .unwrap_or(config.steps_per_iteration);
    if let Some(v) = partial.kt {
        config.thermostat.kt = v;
    }
    if let Some(v) = partial.gamma {
        config.thermostat.gamma = v;
    }
    if let Some(v) = partial.seed {
        config.thermostat.seed = v;
    }
    if let Some(v) = partial.write_trajectory {
        config.write_trajectory = v;
    }
}

fn merge_warmup(base: WarmupPolicy, partial: &PartialWarmupConfig) -> Result<WarmupPolicy> {
    let mut policy = base;
    if let Some(v) = partial.min_distance {
        policy.min_distance = v;
    }
    if let Some(v) = partial.steps_per_iteration {
        policy.steps_per_iteration = v;
    }
    match (partial.unbounded, partial.max_iterations) {
        (Some(true), Some(_)) => {
            return Err(CliError::Config(
                "`warmup.unbounded` and `warmup.max-iterations` are mutually exclusive."
                    .to_string(),
            ));
        }
        (Some(true), None) => policy.max_iterations = IterationLimit::Unbounded,
        (_, Some(max)) => policy.max_iterations = IterationLimit::Bounded(max),
        _ => {}
    }

    match &mut policy.rule {
        WarmupRule::ForceCapRamp {
            initial_cap,
            ramp_factor,
            relaxation_steps,
            zero_velocities,
        } => {
            reject_keys(
                "force-cap",
                &[
                    ("f-max", partial.f_max.is_some()),
                    ("gamma", partial.gamma.is_some()),
                    ("max-displacement", partial.max_displacement.is_some()),
                ],
            )?;
            if let Some(v) = partial.initial_cap {
                *initial_cap = v;
            }
            if let Some(v) = partial.ramp_factor {
                *ramp_factor = v;
            }
            if let Some(v) = partial.relaxation_steps {
                *relaxation_steps = v;
            }
            if let Some(v) = partial.zero_velocities {
                *zero_velocities = v;
            }
        }
        WarmupRule::SteepestDescent(params) => {
            reject_keys(
                "steepest-descent",
                &[
                    ("initial-cap", partial.initial_cap.is_some()),
                    ("ramp-factor", partial.ramp_factor.is_some()),
                    ("relaxation-steps", partial.relaxation_steps.is_some()),
                    ("zero-velocities", partial.zero_velocities.is_some()),
                ],
            )?;
            if let Some(v) = partial.f_max {
                params.f_max = v;
            }
            if let Some(v) = partial.gamma {
                params.gamma = v;
            }
            if let Some(v) = partial.max_displacement {
                params.max_displacement = v;
            }
        }
    }

    policy.validate()?;
    Ok(policy)
}

fn reject_keys(strategy: &str, keys: &[(&str, bool)]) -> Result<()> {
    match keys.iter().find(|(_, present)| *present) {
        Some((key, _)) => Err(CliError::Config(format!(
            "`warmup.{key}` does not apply to the {strategy} warmup."
        ))),
        None => Ok(()),
    }
}
