use super::potentials::{self, PairTerm};
use crate::core::models::ids::{BondTypeId, ParticleType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("Parameter '{name}' must be {requirement}, got {value}")]
    OutOfRange {
        name: &'static str,
        requirement: &'static str,
        value: f64,
    },
}

fn check(
    name: &'static str,
    value: f64,
    ok: bool,
    requirement: &'static str,
) -> Result<(), ParamError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(ParamError::OutOfRange {
            name,
            requirement,
            value,
        })
    }
}

/// How a truncated Lennard-Jones potential is shifted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Shift {
    /// No shift; the potential jumps to zero at the cutoff.
    None,
    /// Shift so that the potential is zero at the cutoff.
    #[default]
    Auto,
    /// A fixed energy offset.
    Value(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LennardJonesParams {
    pub epsilon: f64,
    pub sigma: f64,
    pub cutoff: f64,
    pub shift: Shift,
}

impl LennardJonesParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check("epsilon", self.epsilon, self.epsilon >= 0.0, "non-negative")?;
        check("sigma", self.sigma, self.sigma > 0.0, "positive")?;
        check("cutoff", self.cutoff, self.cutoff > 0.0, "positive")?;
        if let Shift::Value(v) = self.shift {
            check("shift", v, true, "finite")?;
        }
        Ok(())
    }

    /// Energy offset actually added inside the cutoff.
    pub fn offset(&self) -> f64 {
        match self.shift {
            Shift::None => 0.0,
            Shift::Auto => {
                potentials::lennard_jones_auto_shift(self.epsilon, self.sigma, self.cutoff)
            }
            Shift::Value(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WcaParams {
    pub epsilon: f64,
    pub sigma: f64,
}

impl WcaParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        check("epsilon", self.epsilon, self.epsilon >= 0.0, "non-negative")?;
        check("sigma", self.sigma, self.sigma > 0.0, "positive")
    }
}

/// A non-bonded pair potential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NonBondedPotential {
    LennardJones(LennardJonesParams),
    Wca(WcaParams),
}

impl NonBondedPotential {
    pub fn validate(&self) -> Result<(), ParamError> {
        match self {
            Self::LennardJones(p) => p.validate(),
            Self::Wca(p) => p.validate(),
        }
    }

    /// Range beyond which the potential is exactly zero.
    pub fn cutoff(&self) -> f64 {
        match self {
            Self::LennardJones(p) => p.cutoff,
            Self::Wca(p) => potentials::wca_cutoff(p.sigma),
        }
    }

    #[inline]
    pub fn evaluate(&self, dist: f64) -> PairTerm {
        match self {
            Self::LennardJones(p) => {
                potentials::lennard_jones(dist, p.epsilon, p.sigma, p.cutoff, p.offset())
            }
            Self::Wca(p) => potentials::wca(dist, p.epsilon, p.sigma),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeneParams {
    pub k: f64,
    pub d_r_max: f64,
    #[serde(default)]
    pub r_0: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarmonicParams {
    pub k: f64,
    pub r_0: f64,
}

/// A bonded interaction between two particles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BondedPotential {
    Fene(FeneParams),
    Harmonic(HarmonicParams),
}

impl BondedPotential {
    pub fn validate(&self) -> Result<(), ParamError> {
        match self {
            Self::Fene(p) => {
                check("k", p.k, p.k >= 0.0, "non-negative")?;
                check("d_r_max", p.d_r_max, p.d_r_max > 0.0, "positive")?;
                check("r_0", p.r_0, p.r_0 >= 0.0, "non-negative")
            }
            Self::Harmonic(p) => {
                check("k", p.k, p.k >= 0.0, "non-negative")?;
                check("r_0", p.r_0, p.r_0 >= 0.0, "non-negative")
            }
        }
    }

    /// Evaluates the bond at separation `dist`; `None` means the bond is broken.
    #[inline]
    pub fn evaluate(&self, dist: f64) -> Option<PairTerm> {
        match self {
            Self::Fene(p) => potentials::fene(dist, p.k, p.d_r_max, p.r_0),
            Self::Harmonic(p) => Some(potentials::harmonic(dist, p.k, p.r_0)),
        }
    }
}

/// Unordered pair of particle types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypePair(ParticleType, ParticleType);

impl TypePair {
    pub fn new(a: ParticleType, b: ParticleType) -> Self {
        if a <= b { Self(a, b) } else { Self(b, a) }
    }
}

/// Registry of every interaction known to an engine.
#[derive(Debug, Clone, Default)]
pub struct InteractionSet {
    non_bonded: HashMap<TypePair, NonBondedPotential>,
    bonded: Vec<BondedPotential>,
}

impl InteractionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the pair potential between two particle types.
    pub fn set_non_bonded(
        &mut self,
        a: ParticleType,
        b: ParticleType,
        potential: NonBondedPotential,
    ) -> Result<(), ParamError> {
        potential.validate()?;
        self.non_bonded.insert(TypePair::new(a, b), potential);
        Ok(())
    }

    /// Registers a bonded potential and returns the id bonds refer to it by.
    pub fn add_bonded(&mut self, potential: BondedPotential) -> Result<BondTypeId, ParamError> {
        potential.validate()?;
        self.bonded.push(potential);
        Ok(BondTypeId(self.bonded.len() - 1))
    }

    pub fn non_bonded(&self, a: ParticleType, b: ParticleType) -> Option<&NonBondedPotential> {
        self.non_bonded.get(&TypePair::new(a, b))
    }

    pub fn bonded(&self, id: BondTypeId) -> Option<&BondedPotential> {
        self.bonded.get(id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lj() -> LennardJonesParams {
        LennardJonesParams {
            epsilon: 1.0,
            sigma: 1.0,
            cutoff: 2.5,
            shift: Shift::Auto,
        }
    }

    #[test]
    fn type_pair_is_unordered() {
        assert_eq!(
            TypePair::new(ParticleType(1), ParticleType(0)),
            TypePair::new(ParticleType(0), ParticleType(1))
        );
    }

    #[test]
    fn non_bonded_lookup_is_symmetric() {
        let mut set = InteractionSet::new();
        set.set_non_bonded(ParticleType(0), ParticleType(1), NonBondedPotential::LennardJones(lj()))
            .unwrap();
        assert!(set.non_bonded(ParticleType(1), ParticleType(0)).is_some());
        assert!(set.non_bonded(ParticleType(1), ParticleType(1)).is_none());
    }

    #[test]
    fn invalid_sigma_is_rejected() {
        let mut set = InteractionSet::new();
        let bad = NonBondedPotential::Wca(WcaParams {
            epsilon: 1.0,
            sigma: 0.0,
        });
        let err = set
            .set_non_bonded(ParticleType(0), ParticleType(0), bad)
            .unwrap_err();
        assert!(matches!(err, ParamError::OutOfRange { name: "sigma", .. }));
    }

    #[test]
    fn bonded_ids_are_assigned_sequentially() {
        let mut set = InteractionSet::new();
        let fene = set
            .add_bonded(BondedPotential::Fene(FeneParams {
                k: 10.0,
                d_r_max: 2.0,
                r_0: 0.0,
            }))
            .unwrap();
        let harmonic = set
            .add_bonded(BondedPotential::Harmonic(HarmonicParams { k: 1.0, r_0: 1.0 }))
            .unwrap();
        assert_eq!(fene, BondTypeId(0));
        assert_eq!(harmonic, BondTypeId(1));
        assert!(set.bonded(BondTypeId(2)).is_none());
    }

    #[test]
    fn auto_shift_offset_matches_potential_value_at_cutoff() {
        let params = lj();
        let expected = potentials::lennard_jones_auto_shift(1.0, 1.0, 2.5);
        assert_eq!(params.offset(), expected);
        assert_eq!(
            LennardJonesParams {
                shift: Shift::None,
                ..params
            }
            .offset(),
            0.0
        );
    }

    #[test]
    fn wca_cutoff_is_at_lennard_jones_minimum() {
        let wca = NonBondedPotential::Wca(WcaParams {
            epsilon: 1.0,
            sigma: 2.0,
        });
        assert!((wca.cutoff() - 2.0 * 2f64.powf(1.0 / 6.0)).abs() < 1e-12);
    }
}
