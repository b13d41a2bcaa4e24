pub mod lj_liquid;
pub mod polymer;

use crate::error::Result;
use mdwarm::core::io::RunOutputs;
use mdwarm::workflows::RunSummary;
use rand::Rng;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Paths of the files written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub log: PathBuf,
    pub observables: PathBuf,
    pub trajectory: Option<PathBuf>,
}

impl OutputPaths {
    /// `<dir>/<name>_<tag>_<job>.{log,obs,xyz}`.
    pub fn new(dir: &Path, name: &str, tag: &str, job_id: &str, trajectory: bool) -> Self {
        let stem = format!("{name}_{tag}_{job_id}");
        Self {
            log: dir.join(format!("{stem}.log")),
            observables: dir.join(format!("{stem}.obs")),
            trajectory: trajectory.then(|| dir.join(format!("{stem}.xyz"))),
        }
    }

    /// Creates the output directory and opens every file for writing.
    pub fn open(&self) -> Result<RunOutputs<BufWriter<File>>> {
        if let Some(dir) = self.log.parent() {
            fs::create_dir_all(dir)?;
        }
        let create = |path: &Path| -> Result<BufWriter<File>> {
            Ok(BufWriter::new(File::create(path)?))
        };
        let trajectory = self.trajectory.as_deref().map(create).transpose()?;
        Ok(RunOutputs::new(
            create(&self.log)?,
            create(&self.observables)?,
            trajectory,
        ))
    }
}

/// The given job id, or eight random hex digits.
pub fn job_id(given: Option<&str>) -> String {
    match given {
        Some(id) => id.to_string(),
        None => format!("{:08x}", rand::thread_rng().r#gen::<u32>()),
    }
}

fn print_summary(summary: &RunSummary, paths: &OutputPaths) {
    let warmup = &summary.warmup;
    info!(
        converged = warmup.converged,
        warmup_iterations = warmup.iterations,
        production_iterations = summary.production_iterations,
        "Run finished"
    );
    println!(
        "Warmup {} after {} iteration(s), minimal distance {:.4}.",
        if warmup.converged {
            "converged"
        } else {
            "stopped"
        },
        warmup.iterations,
        warmup.final_min_distance
    );
    println!(
        "Ran {} production iteration(s) on {} particles, final time {:.4}.",
        summary.production_iterations, summary.particle_count, summary.final_time
    );
    println!("Log:         {}", paths.log.display());
    println!("Observables: {}", paths.observables.display());
    if let Some(trajectory) = &paths.trajectory {
        println!("Trajectory:  {}", trajectory.display());
    }
}
