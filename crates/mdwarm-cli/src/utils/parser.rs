use mdwarm::engine::config::Scales;
use thiserror::Error;

/// Placeholder that keeps the default value of a positional slot.
const KEEP_DEFAULT: &str = "-";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Expected either no scale factors or exactly three, got {0}.")]
    WrongScaleCount(usize),

    #[error("Invalid {slot} scale '{value}'. Expected an integer or '-'.")]
    InvalidScale { slot: &'static str, value: String },

    #[error("Invalid --set format: '{0}'. Expected KEY=VALUE.")]
    InvalidAssignment(String),

    #[error("Invalid --set key '{0}'. Expected SECTION.KEY (e.g., 'warmup.ramp-factor').")]
    InvalidKey(String),
}

/// Applies positional scale factors on top of `defaults`.
pub fn parse_scales(values: &[String], defaults: Scales) -> Result<Scales, ParseError> {
    match values.len() {
        0 => return Ok(defaults),
        3 => {}
        n => return Err(ParseError::WrongScaleCount(n)),
    }
    let slot = |index: usize, slot: &'static str, default: i64| -> Result<i64, ParseError> {
        let value = values[index].trim();
        if value == KEEP_DEFAULT {
            return Ok(default);
        }
        value.parse().map_err(|_| ParseError::InvalidScale {
            slot,
            value: value.to_string(),
        })
    };
    Ok(Scales {
        particles: slot(0, "particle", defaults.particles)?,
        density: slot(1, "density", defaults.density)?,
        temperature: slot(2, "temperature", defaults.temperature)?,
    })
}

/// Splits `section.key=value` into its three parts.
pub fn parse_assignment(assignment: &str) -> Result<(&str, &str, &str), ParseError> {
    let (path, value) = assignment
        .split_once('=')
        .ok_or_else(|| ParseError::InvalidAssignment(assignment.to_string()))?;
    let (section, key) = path
        .trim()
        .split_once('.')
        .ok_or_else(|| ParseError::InvalidKey(path.to_string()))?;
    if section.is_empty() || key.is_empty() || key.contains('.') {
        return Err(ParseError::InvalidKey(path.to_string()));
    }
    Ok((section, key, value.trim()))
}
