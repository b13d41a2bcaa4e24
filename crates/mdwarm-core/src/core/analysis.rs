use crate::core::forcefield::evaluation::Evaluation;
use crate::core::models::system::ParticleSystem;
use nalgebra::{Matrix3, Point3, SymmetricEigen, Vector3};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Particle range {start}..{end} is empty or exceeds the {available} particles present")]
    InvalidRange {
        start: usize,
        end: usize,
        available: usize,
    },
}

/// Energy breakdown of one configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyReport {
    pub kinetic: f64,
    pub bonded: f64,
    pub non_bonded: f64,
}

impl EnergyReport {
    pub fn from_evaluation(system: &ParticleSystem, evaluation: &Evaluation) -> Self {
        Self {
            kinetic: kinetic_energy(system),
            bonded: evaluation.bonded,
            non_bonded: evaluation.non_bonded,
        }
    }

    #[inline]
    pub fn potential(&self) -> f64 {
        self.bonded + self.non_bonded
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.kinetic + self.potential()
    }
}

impl fmt::Display for EnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={:+.4e} kinetic={:+.4e} bonded={:+.4e} non_bonded={:+.4e}",
            self.total(),
            self.kinetic,
            self.bonded,
            self.non_bonded
        )
    }
}

/// Smallest minimum-image distance between any two particles.
///
/// Returns `f64::INFINITY` when fewer than two particles are present, so that an empty or
/// single-particle system always satisfies a distance criterion.
pub fn min_distance(system: &ParticleSystem) -> f64 {
    let sim_box = system.simulation_box();
    let positions = system.positions();
    let mut min_sq = f64::INFINITY;
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            let d_sq = sim_box.separation(a, b).norm_squared();
            if d_sq < min_sq {
                min_sq = d_sq;
            }
        }
    }
    min_sq.sqrt()
}

pub fn kinetic_energy(system: &ParticleSystem) -> f64 {
    system.iter().map(|(_, p)| p.kinetic_energy()).sum()
}

/// Scalar pressure from the kinetic energy and the pair virial: `(2 E_kin + W) / (3 V)`.
pub fn pressure(system: &ParticleSystem, evaluation: &Evaluation) -> f64 {
    let volume = system.simulation_box().volume();
    (2.0 * kinetic_energy(system) + evaluation.virial) / (3.0 * volume)
}

/// Gyration tensor of a set of particles and the shape descriptors derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GyrationTensor {
    pub tensor: Matrix3<f64>,
    pub center_of_mass: Point3<f64>,
    /// Principal moments, largest first.
    pub principal_moments: Vector3<f64>,
}

impl GyrationTensor {
    /// Computes the (unweighted) gyration tensor of `positions`, which must be unfolded.
    pub fn from_positions(positions: &[Point3<f64>]) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        let n = positions.len() as f64;
        let center = positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / n;
        let tensor = positions.iter().fold(Matrix3::zeros(), |acc, p| {
            let r = p.coords - center;
            acc + r * r.transpose()
        }) / n;

        let mut moments: Vec<f64> = SymmetricEigen::new(tensor)
            .eigenvalues
            .iter()
            .copied()
            .collect();
        moments.sort_by(|a, b| b.total_cmp(a));

        Some(Self {
            tensor,
            center_of_mass: Point3::from(center),
            principal_moments: Vector3::new(moments[0], moments[1], moments[2]),
        })
    }

    /// Squared radius of gyration, the trace of the tensor.
    #[inline]
    pub fn rg_squared(&self) -> f64 {
        self.tensor.trace()
    }

    #[inline]
    pub fn radius_of_gyration(&self) -> f64 {
        self.rg_squared().max(0.0).sqrt()
    }

    /// `λ1 - (λ2 + λ3) / 2`, zero for a spherically symmetric distribution.
    #[inline]
    pub fn asphericity(&self) -> f64 {
        let l = &self.principal_moments;
        l.x - 0.5 * (l.y + l.z)
    }
}

/// Gyration tensor of the particles with insertion indices `start..start + count`.
pub fn gyration_tensor(
    system: &ParticleSystem,
    start: usize,
    count: usize,
) -> Result<GyrationTensor, AnalysisError> {
    let available = system.len();
    let end = start.saturating_add(count);
    let invalid = AnalysisError::InvalidRange {
        start,
        end,
        available,
    };
    if count == 0 || end > available {
        return Err(invalid);
    }
    let positions: Vec<_> = system
        .iter()
        .skip(start)
        .take(count)
        .map(|(_, p)| p.position)
        .collect();
    GyrationTensor::from_positions(&positions).ok_or(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::forcefield::evaluation::evaluate;
    use crate::core::forcefield::params::InteractionSet;
    use crate::core::models::ids::ParticleType;
    use crate::core::models::particle::Particle;
    use crate::core::models::simulation_box::SimulationBox;

    const TOLERANCE: f64 = 1e-9;

    fn system_from(positions: &[[f64; 3]]) -> ParticleSystem {
        let mut system = ParticleSystem::new(SimulationBox::cubic(10.0).unwrap());
        for p in positions {
            system.add_particle(Particle::new(Point3::new(p[0], p[1], p[2]), ParticleType(0)));
        }
        system
    }

    #[test]
    fn min_distance_finds_closest_pair() {
        let system = system_from(&[[1.0, 1.0, 1.0], [3.0, 1.0, 1.0], [3.5, 1.0, 1.0]]);
        assert!((min_distance(&system) - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn min_distance_respects_periodic_images() {
        let system = system_from(&[[0.1, 5.0, 5.0], [9.8, 5.0, 5.0]]);
        assert!((min_distance(&system) - 0.3).abs() < TOLERANCE);
    }

    #[test]
    fn min_distance_of_single_particle_is_infinite() {
        let system = system_from(&[[1.0, 1.0, 1.0]]);
        assert!(min_distance(&system).is_infinite());
    }

    #[test]
    fn energy_report_totals_components() {
        let report = EnergyReport {
            kinetic: 1.0,
            bonded: 2.0,
            non_bonded: -0.5,
        };
        assert!((report.potential() - 1.5).abs() < TOLERANCE);
        assert!((report.total() - 2.5).abs() < TOLERANCE);
    }

    #[test]
    fn ideal_gas_pressure_is_kinetic_only() {
        let mut system = system_from(&[[1.0, 1.0, 1.0], [5.0, 5.0, 5.0]]);
        for (_, p) in system.particles_mut() {
            p.velocity = Vector3::new(1.0, 0.0, 0.0);
        }
        let eval = evaluate(&system, &InteractionSet::new()).unwrap();
        let expected = 2.0 * 1.0 / (3.0 * 1000.0);
        assert!((pressure(&system, &eval) - expected).abs() < TOLERANCE);
    }

    #[test]
    fn gyration_of_rod_is_fully_aspherical() {
        let system = system_from(&[[1.0, 5.0, 5.0], [2.0, 5.0, 5.0], [3.0, 5.0, 5.0]]);
        let g = gyration_tensor(&system, 0, 3).unwrap();
        assert!((g.rg_squared() - 2.0 / 3.0).abs() < TOLERANCE);
        assert!((g.asphericity() - g.rg_squared()).abs() < TOLERANCE);
        assert!((g.principal_moments.y - g.principal_moments.z).abs() < TOLERANCE);
        assert!((g.center_of_mass.x - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn gyration_uses_only_requested_range() {
        let system = system_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [9.0, 9.0, 9.0]]);
        let g = gyration_tensor(&system, 0, 2).unwrap();
        assert!((g.radius_of_gyration() - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn gyration_rejects_out_of_range_requests() {
        let system = system_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        assert!(gyration_tensor(&system, 1, 2).is_err());
        assert!(gyration_tensor(&system, 0, 0).is_err());
    }
}
