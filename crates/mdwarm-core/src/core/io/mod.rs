//! Plain-text outputs of a simulation run.
//!
//! A run produces up to three line-oriented streams: a human-readable log, a table of
//! observables with one row per production iteration, and an XYZ trajectory with one
//! frame per production iteration. [`RunOutputs`] bundles them so that workflows can be
//! pointed at files, in-memory buffers or anything else implementing [`Write`].

pub mod observables;
pub mod runlog;
pub mod xyz;

use observables::ObservableWriter;
use runlog::RunLog;
use std::io::Write;
use thiserror::Error;
use xyz::XyzWriter;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write observable row: {0}")]
    Csv(#[from] csv::Error),
}

/// The set of output streams a workflow writes to.
pub struct RunOutputs<W: Write> {
    pub log: RunLog<W>,
    pub observables: ObservableWriter<W>,
    pub trajectory: Option<XyzWriter<W>>,
}

impl<W: Write> RunOutputs<W> {
    pub fn new(log: W, observables: W, trajectory: Option<W>) -> Self {
        Self {
            log: RunLog::new(log),
            observables: ObservableWriter::new(observables),
            trajectory: trajectory.map(XyzWriter::new),
        }
    }

    /// Flushes every stream.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.log.flush()?;
        self.observables.flush()?;
        if let Some(trajectory) = self.trajectory.as_mut() {
            trajectory.flush()?;
        }
        Ok(())
    }
}
