use super::params::InteractionSet;
use crate::core::models::ids::{BondTypeId, ParticleId};
use crate::core::models::system::ParticleSystem;
use nalgebra::Vector3;
use slotmap::SecondaryMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Bond between {first:?} and {second:?} broke at length {length:.4}")]
    BondBroken {
        first: ParticleId,
        second: ParticleId,
        length: f64,
    },
    #[error("Bond refers to unregistered {0}")]
    UnknownBondType(BondTypeId),
}

/// Forces, potential energies and virial of one configuration.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub forces: SecondaryMap<ParticleId, Vector3<f64>>,
    pub non_bonded: f64,
    pub bonded: f64,
    /// Sum over interacting pairs of `r_ij · F_ij`.
    pub virial: f64,
}

impl Evaluation {
    #[inline]
    pub fn potential(&self) -> f64 {
        self.non_bonded + self.bonded
    }

    /// Largest force magnitude on any single particle.
    pub fn max_force(&self) -> f64 {
        self.forces
            .values()
            .map(|f| f.norm())
            .fold(0.0, f64::max)
    }
}

/// Evaluates every non-bonded pair and every bond of `system` under the minimum image.
///
/// Non-bonded interactions are not excluded between bonded particles.
///
/// # Errors
///
/// Returns [`EvaluationError::BondBroken`] if a bond is beyond its maximal extension and
/// [`EvaluationError::UnknownBondType`] if a bond refers to an unregistered potential.
pub fn evaluate(
    system: &ParticleSystem,
    interactions: &InteractionSet,
) -> Result<Evaluation, EvaluationError> {
    let sim_box = system.simulation_box();
    let mut forces: SecondaryMap<ParticleId, Vector3<f64>> = system
        .ids()
        .iter()
        .map(|&id| (id, Vector3::zeros()))
        .collect();
    let mut non_bonded = 0.0;
    let mut bonded = 0.0;
    let mut virial = 0.0;

    let particles: Vec<_> = system.iter().collect();
    for (i, &(id_a, a)) in particles.iter().enumerate() {
        for &(id_b, b) in &particles[i + 1..] {
            let Some(potential) = interactions.non_bonded(a.particle_type, b.particle_type)
            else {
                continue;
            };
            let d = sim_box.separation(&a.position, &b.position);
            let dist = d.norm();
            if dist >= potential.cutoff() {
                continue;
            }
            let term = potential.evaluate(dist);
            non_bonded += term.energy;
            let f_on_b = unit_or_x(&d, dist) * term.force;
            forces[id_b] += f_on_b;
            forces[id_a] -= f_on_b;
            virial += term.force * dist;
        }
    }

    for bond in system.bonds() {
        let potential = interactions
            .bonded(bond.bond_type)
            .ok_or(EvaluationError::UnknownBondType(bond.bond_type))?;
        let (Some(a), Some(b)) = (system.particle(bond.first), system.particle(bond.second))
        else {
            continue;
        };
        let d = sim_box.separation(&a.position, &b.position);
        let dist = d.norm();
        let term = potential
            .evaluate(dist)
            .ok_or(EvaluationError::BondBroken {
                first: bond.first,
                second: bond.second,
                length: dist,
            })?;
        bonded += term.energy;
        let f_on_b = unit_or_x(&d, dist) * term.force;
        forces[bond.second] += f_on_b;
        forces[bond.first] -= f_on_b;
        virial += term.force * dist;
    }

    Ok(Evaluation {
        forces,
        non_bonded,
        bonded,
        virial,
    })
}

#[inline]
fn unit_or_x(d: &Vector3<f64>, dist: f64) -> Vector3<f64> {
    if dist > 0.0 { d / dist } else { Vector3::x() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::params::{
        BondedPotential, FeneParams, LennardJonesParams, NonBondedPotential, Shift, WcaParams,
    };
    use crate::core::models::ids::ParticleType;
    use crate::core::models::particle::Particle;
    use crate::core::models::simulation_box::SimulationBox;
    use nalgebra::Point3;

    const TOLERANCE: f64 = 1e-9;

    fn pair_system(separation: f64) -> (ParticleSystem, ParticleId, ParticleId) {
        let mut system = ParticleSystem::new(SimulationBox::cubic(10.0).unwrap());
        let a = system.add_particle(Particle::new(Point3::new(5.0, 5.0, 5.0), ParticleType(0)));
        let b = system.add_particle(Particle::new(
            Point3::new(5.0 + separation, 5.0, 5.0),
            ParticleType(0),
        ));
        (system, a, b)
    }

    fn wca_set() -> InteractionSet {
        let mut set = InteractionSet::new();
        set.set_non_bonded(
            ParticleType(0),
            ParticleType(0),
            NonBondedPotential::Wca(WcaParams {
                epsilon: 1.0,
                sigma: 1.0,
            }),
        )
        .unwrap();
        set
    }

    #[test]
    fn overlapping_pair_repels_with_equal_and_opposite_forces() {
        let (system, a, b) = pair_system(0.9);
        let eval = evaluate(&system, &wca_set()).unwrap();
        assert!(eval.non_bonded > 0.0);
        assert!(eval.forces[b].x > 0.0);
        assert!((eval.forces[a] + eval.forces[b]).norm() < TOLERANCE);
        assert!(eval.virial > 0.0);
    }

    #[test]
    fn pairs_beyond_cutoff_do_not_interact() {
        let (system, a, _) = pair_system(2.0);
        let eval = evaluate(&system, &wca_set()).unwrap();
        assert_eq!(eval.non_bonded, 0.0);
        assert_eq!(eval.forces[a], Vector3::zeros());
        assert_eq!(eval.max_force(), 0.0);
    }

    #[test]
    fn interaction_across_periodic_boundary_uses_minimum_image() {
        let mut system = ParticleSystem::new(SimulationBox::cubic(10.0).unwrap());
        let a = system.add_particle(Particle::new(Point3::new(0.2, 5.0, 5.0), ParticleType(0)));
        system.add_particle(Particle::new(Point3::new(9.7, 5.0, 5.0), ParticleType(0)));
        let eval = evaluate(&system, &wca_set()).unwrap();
        assert!(eval.non_bonded > 0.0);
        assert!(eval.forces[a].x > 0.0);
    }

    #[test]
    fn untyped_pairs_are_skipped() {
        let (system, _, _) = pair_system(0.5);
        let eval = evaluate(&system, &InteractionSet::new()).unwrap();
        assert_eq!(eval.potential(), 0.0);
    }

    #[test]
    fn stretched_fene_bond_pulls_particles_together() {
        let (mut system, a, b) = pair_system(1.5);
        let mut set = InteractionSet::new();
        let fene = set
            .add_bonded(BondedPotential::Fene(FeneParams {
                k: 10.0,
                d_r_max: 2.0,
                r_0: 0.0,
            }))
            .unwrap();
        system.add_bond(a, b, fene).unwrap();
        let eval = evaluate(&system, &set).unwrap();
        assert!(eval.bonded > 0.0);
        assert!(eval.forces[b].x < 0.0);
        assert!(eval.forces[a].x > 0.0);
    }

    #[test]
    fn overstretched_fene_bond_is_reported() {
        let (mut system, a, b) = pair_system(2.5);
        let mut set = InteractionSet::new();
        let fene = set
            .add_bonded(BondedPotential::Fene(FeneParams {
                k: 10.0,
                d_r_max: 2.0,
                r_0: 0.0,
            }))
            .unwrap();
        system.add_bond(a, b, fene).unwrap();
        let err = evaluate(&system, &set).unwrap_err();
        assert!(matches!(err, EvaluationError::BondBroken { .. }));
    }

    #[test]
    fn bond_with_unregistered_type_is_reported() {
        let (mut system, a, b) = pair_system(1.0);
        system.add_bond(a, b, BondTypeId(3)).unwrap();
        let err = evaluate(&system, &InteractionSet::new()).unwrap_err();
        assert_eq!(err, EvaluationError::UnknownBondType(BondTypeId(3)));
    }

    #[test]
    fn lennard_jones_pair_at_minimum_has_negative_energy() {
        let (system, _, _) = pair_system(2f64.powf(1.0 / 6.0));
        let mut set = InteractionSet::new();
        set.set_non_bonded(
            ParticleType(0),
            ParticleType(0),
            NonBondedPotential::LennardJones(LennardJonesParams {
                epsilon: 1.0,
                sigma: 1.0,
                cutoff: 2.5,
                shift: Shift::None,
            }),
        )
        .unwrap();
        let eval = evaluate(&system, &set).unwrap();
        assert!((eval.non_bonded + 1.0).abs() < 1e-9);
        assert!(eval.max_force() < 1e-9);
    }
}
