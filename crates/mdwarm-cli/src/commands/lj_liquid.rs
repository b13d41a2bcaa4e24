use super::{OutputPaths, job_id, print_summary};
use crate::cli::{Cli, LjLiquidArgs};
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdwarm::engine::progress::ProgressReporter;
use mdwarm::workflows;
use tracing::{debug, info};

pub fn run(cli: &Cli, args: &LjLiquidArgs) -> Result<()> {
    let config = PartialRunConfig::load(cli.config.as_deref(), &cli.set_values)?
        .merge_lj_liquid(args)?;
    debug!("Final Lennard-Jones configuration: {:?}", config);

    let scales = config.scales;
    let tag = format!(
        "{}-{}-{}",
        scales.particles, scales.density, scales.temperature
    );
    let paths = OutputPaths::new(
        &cli.output_dir,
        "lj_liquid",
        &tag,
        &job_id(cli.job_id.as_deref()),
        config.production.write_trajectory,
    );
    info!("Writing outputs to {:?}", paths.log.parent());
    let mut outputs = paths.open()?;

    let progress_handler = if cli.quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Simulating {} Lennard-Jones particles at T = {:.1} K...",
        config.particle_count(),
        config.temperature()
    );
    let summary = workflows::lj_liquid::run(&config, &mut outputs, &reporter)?;
    print_summary(&summary, &paths);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn run_writes_log_observables_and_trajectory() {
        let dir = tempdir().unwrap();
        let out = dir.path().to_str().unwrap();
        let cli = Cli::parse_from([
            "mdwarm",
            "-q",
            "-o",
            out,
            "--job-id",
            "t1",
            "-S",
            "lj-liquid.base-particles=8",
            "lj-liquid",
            "--iterations",
            "2",
            "--steps-per-iteration",
            "5",
        ]);
        let Commands::LjLiquid(args) = &cli.command else {
            panic!("expected lj-liquid");
        };
        run(&cli, args).unwrap();

        let stem = dir.path().join("lj_liquid_1-1-1_t1");
        let obs = std::fs::read_to_string(stem.with_extension("obs")).unwrap();
        assert_eq!(obs.lines().count(), 3);
        let log = std::fs::read_to_string(stem.with_extension("log")).unwrap();
        assert!(log.contains("Simulate 8 particles"));
        assert!(stem.with_extension("xyz").exists());
    }
}
