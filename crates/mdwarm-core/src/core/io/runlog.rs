use super::OutputError;
use std::fmt::Display;
use std::io::Write;

/// Line-oriented, human-readable progress log of a single run.
pub struct RunLog<W: Write> {
    writer: W,
}

impl<W: Write> RunLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Appends one line.
    pub fn line(&mut self, message: impl Display) -> Result<(), OutputError> {
        writeln!(self.writer, "{message}")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
