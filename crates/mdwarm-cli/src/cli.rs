use clap::{Args, Parser, Subcommand, ValueEnum};
use mdwarm::engine::config::WarmupStrategy;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "mdwarm developers",
    version,
    about = "mdwarm - Molecular-dynamics drivers with an explicit overlap-removal warmup.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Directory receiving the run log, observables and trajectory
    #[arg(short, long, global = true, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Identifier appended to output file names. A random hex id is used if omitted.
    #[arg(long, global = true, value_name = "ID")]
    pub job_id: Option<String>,

    /// Path to a run configuration file in TOML format
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S warmup.ramp-factor=1.02
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Simulate an argon-like Lennard-Jones fluid in a cubic box.
    LjLiquid(LjLiquidArgs),
    /// Simulate bead-spring polymer chains.
    Polymer(PolymerArgs),
}

/// Overrides shared by every run.
#[derive(Args, Debug, Clone, Default)]
pub struct ProductionArgs {
    /// Override the number of production iterations.
    #[arg(long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Override the number of integration steps per production iteration.
    #[arg(long, value_name = "INT")]
    pub steps_per_iteration: Option<u64>,
}

/// Arguments for the `lj-liquid` subcommand.
#[derive(Args, Debug)]
pub struct LjLiquidArgs {
    /// Scale factors for particle count, density and temperature.
    /// Give none or all three; '-' keeps the default of a slot.
    #[arg(value_name = "SCALE", num_args = 0..=3)]
    pub scales: Vec<String>,

    /// Do not write the XYZ trajectory.
    #[arg(long)]
    pub no_trajectory: bool,

    #[command(flatten)]
    pub production: ProductionArgs,
}

/// Warmup strategy choices on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupArg {
    /// Integrate under a slowly growing force cap.
    ForceCap,
    /// Minimize with steepest descent.
    SteepestDescent,
}

impl From<WarmupArg> for WarmupStrategy {
    fn from(arg: WarmupArg) -> Self {
        match arg {
            WarmupArg::ForceCap => WarmupStrategy::ForceCap,
            WarmupArg::SteepestDescent => WarmupStrategy::SteepestDescent,
        }
    }
}

/// Arguments for the `polymer` subcommand.
#[derive(Args, Debug)]
pub struct PolymerArgs {
    /// Number of polymer chains.
    #[arg(long, value_name = "INT", alias = "n_polymers")]
    pub n_polymers: Option<usize>,

    /// Number of beads in each chain.
    #[arg(
        long,
        value_name = "INT",
        visible_alias = "n-bead-per-chain",
        aliases = ["n_beads_per_chain", "n_bead_per_chain"]
    )]
    pub n_beads_per_chain: Option<usize>,

    /// Edge length of the cubic box.
    #[arg(long, value_name = "LENGTH", alias = "box_l")]
    pub box_l: Option<f64>,

    /// Overlap-removal strategy.
    #[arg(long, value_enum, value_name = "STRATEGY")]
    pub warmup: Option<WarmupArg>,

    /// Also write an XYZ trajectory.
    #[arg(long)]
    pub trajectory: bool,

    #[command(flatten)]
    pub production: ProductionArgs,
}
