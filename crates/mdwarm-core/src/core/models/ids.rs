use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    pub struct ParticleId;
}

/// Index of a registered bonded interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BondTypeId(pub usize);

/// Non-bonded type tag of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ParticleType(pub u32);

impl fmt::Display for BondTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bond type {}", self.0)
    }
}

impl fmt::Display for ParticleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
