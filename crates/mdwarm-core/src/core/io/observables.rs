use super::OutputError;
use serde::Serialize;
use std::io::Write;

/// Energy and pressure observables of one production iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyObservables {
    pub iteration: usize,
    pub time: f64,
    pub kinetic: f64,
    pub potential: f64,
    pub total: f64,
    pub pressure: f64,
}

/// Chain-shape observables of one production iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GyrationObservables {
    pub iteration: usize,
    pub time: f64,
    pub rg: f64,
    pub rg_squared: f64,
    pub asphericity: f64,
}

/// Comma-separated observable table with a header row taken from the row type.
pub struct ObservableWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ObservableWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(inner),
        }
    }

    pub fn write_row<R: Serialize>(&mut self, row: &R) -> Result<(), OutputError> {
        self.writer.serialize(row)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, OutputError> {
        self.writer
            .into_inner()
            .map_err(|e| OutputError::Io(e.into_error()))
    }
}
