use crate::core::models::simulation_box::SimulationBox;
use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    #[error("Bond length must be finite and positive, got {0}")]
    InvalidBondLength(f64),
    #[error("A polymer needs at least one bead")]
    EmptyChain,
}

/// Places `count` particles uniformly at random inside `sim_box`.
///
/// The same `seed` always yields the same positions.
pub fn random_positions(count: usize, sim_box: &SimulationBox, seed: u64) -> Vec<Point3<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| uniform_in_box(&mut rng, sim_box)).collect()
}

/// Generates `n_polymers` linear chains as random walks with a fixed bond length.
///
/// Each chain starts at a uniformly random point in the box. Positions are unfolded, so a
/// chain may extend past the box faces. The same `seed` always yields the same chains.
///
/// # Errors
///
/// Returns [`PlacementError`] for a non-positive bond length or an empty chain.
pub fn linear_polymer_positions(
    n_polymers: usize,
    beads_per_chain: usize,
    bond_length: f64,
    sim_box: &SimulationBox,
    seed: u64,
) -> Result<Vec<Vec<Point3<f64>>>, PlacementError> {
    if !(bond_length.is_finite() && bond_length > 0.0) {
        return Err(PlacementError::InvalidBondLength(bond_length));
    }
    if beads_per_chain == 0 {
        return Err(PlacementError::EmptyChain);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let chains = (0..n_polymers)
        .map(|_| {
            let mut chain = Vec::with_capacity(beads_per_chain);
            let mut current = uniform_in_box(&mut rng, sim_box);
            chain.push(current);
            for _ in 1..beads_per_chain {
                current += random_unit_vector(&mut rng) * bond_length;
                chain.push(current);
            }
            chain
        })
        .collect();
    Ok(chains)
}

fn uniform_in_box(rng: &mut StdRng, sim_box: &SimulationBox) -> Point3<f64> {
    let l = sim_box.lengths();
    Point3::new(
        rng.r#gen::<f64>() * l.x,
        rng.r#gen::<f64>() * l.y,
        rng.r#gen::<f64>() * l.z,
    )
}

fn random_unit_vector(rng: &mut StdRng) -> Vector3<f64> {
    let z: f64 = rng.gen_range(-1.0..=1.0);
    let phi: f64 = rng.gen_range(0.0..TAU);
    let s = (1.0 - z * z).max(0.0).sqrt();
    Vector3::new(s * phi.cos(), s * phi.sin(), z)
}
