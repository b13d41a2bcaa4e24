use super::{OutputPaths, job_id, print_summary};
use crate::cli::{Cli, PolymerArgs};
use crate::config::PartialRunConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdwarm::engine::progress::ProgressReporter;
use mdwarm::workflows;
use tracing::{debug, info};

pub fn run(cli: &Cli, args: &PolymerArgs) -> Result<()> {
    let config = PartialRunConfig::load(cli.config.as_deref(), &cli.set_values)?
        .merge_polymer(args)?;
    debug!("Final polymer configuration: {:?}", config);

    let tag = format!("{}x{}", config.n_polymers, config.beads_per_chain);
    let paths = OutputPaths::new(
        &cli.output_dir,
        "polymer",
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
        "Simulating {} chain(s) of {} beads...",
        config.n_polymers, config.beads_per_chain
    );
    let summary = workflows::polymer::run(&config, &mut outputs, &reporter)?;
    print_summary(&summary, &paths);
    Ok(())
}
