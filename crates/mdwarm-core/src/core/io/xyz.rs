use super::OutputError;
use nalgebra::Point3;
use std::io::Write;

const FRAME_SEPARATOR: &str = "%";
const PARTICLE_LABEL: &str = "part";

/// Appends trajectory frames in a minimal XYZ dialect.
///
/// Each frame is the particle count, a separator line, and one `part x y z` line per
/// particle.
pub struct XyzWriter<W: Write> {
    writer: W,
    frames: usize,
}

impl<W: Write> XyzWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, frames: 0 }
    }

    pub fn write_frame(&mut self, positions: &[Point3<f64>]) -> Result<(), OutputError> {
        writeln!(self.writer, "{}", positions.len())?;
        writeln!(self.writer, "{FRAME_SEPARATOR}")?;
        for p in positions {
            writeln!(self.writer, "{PARTICLE_LABEL} {} {} {}", p.x, p.y, p.z)?;
        }
        self.frames += 1;
        Ok(())
    }

    /// Number of frames written so far.
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_has_count_separator_and_one_line_per_particle() {
        let mut writer = XyzWriter::new(Vec::new());
        writer
            .write_frame(&[Point3::new(1.0, 2.0, 3.0), Point3::new(0.5, 0.0, -1.5)])
            .unwrap();
        assert_eq!(writer.frames(), 1);
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "2\n%\npart 1 2 3\npart 0.5 0 -1.5\n");
    }

    #[test]
    fn frames_are_appended() {
        let mut writer = XyzWriter::new(Vec::new());
        writer.write_frame(&[Point3::origin()]).unwrap();
        writer.write_frame(&[Point3::origin()]).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text.lines().count(), 6);
    }
}
