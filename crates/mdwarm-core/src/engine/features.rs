use super::error::EngineError;
use super::simulation::SimulationEngine;
use std::fmt;

/// An optional engine capability that a workflow may depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    LennardJones,
    Wca,
    FeneBond,
    HarmonicBond,
    ForceCap,
    SteepestDescent,
    LangevinThermostat,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::LennardJones,
        Feature::Wca,
        Feature::FeneBond,
        Feature::HarmonicBond,
        Feature::ForceCap,
        Feature::SteepestDescent,
        Feature::LangevinThermostat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::LennardJones => "LENNARD_JONES",
            Feature::Wca => "WCA",
            Feature::FeneBond => "FENE",
            Feature::HarmonicBond => "HARMONIC",
            Feature::ForceCap => "FORCE_CAP",
            Feature::SteepestDescent => "STEEPEST_DESCENT",
            Feature::LangevinThermostat => "LANGEVIN",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fails with [`EngineError::MissingFeatures`] listing every feature `engine` lacks.
pub fn require_features<E: SimulationEngine + ?Sized>(
    engine: &E,
    required: &[Feature],
) -> Result<(), EngineError> {
    let missing: Vec<Feature> = required
        .iter()
        .copied()
        .filter(|f| !engine.supports(*f))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::MissingFeatures { missing })
    }
}
