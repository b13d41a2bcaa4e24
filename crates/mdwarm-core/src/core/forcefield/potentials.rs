/// Separations below this are treated as this value to keep forces finite.
pub const MIN_SEPARATION: f64 = 1e-6;

/// Energy and scalar force of a central pair interaction at one separation.
///
/// `force` is `-dV/dr`: positive values push the pair apart.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PairTerm {
    pub energy: f64,
    pub force: f64,
}

impl PairTerm {
    pub const ZERO: PairTerm = PairTerm {
        energy: 0.0,
        force: 0.0,
    };
}

#[inline]
fn lj_core(dist: f64, epsilon: f64, sigma: f64) -> PairTerm {
    let r = dist.max(MIN_SEPARATION);
    let sr6 = (sigma / r).powi(6);
    let sr12 = sr6 * sr6;
    PairTerm {
        energy: 4.0 * epsilon * (sr12 - sr6),
        force: 24.0 * epsilon * (2.0 * sr12 - sr6) / r,
    }
}

/// Lennard-Jones 12-6 potential, truncated at `cutoff` and shifted by `shift`.
#[inline]
pub fn lennard_jones(dist: f64, epsilon: f64, sigma: f64, cutoff: f64, shift: f64) -> PairTerm {
    if dist >= cutoff {
        return PairTerm::ZERO;
    }
    let term = lj_core(dist, epsilon, sigma);
    PairTerm {
        energy: term.energy + shift,
        force: term.force,
    }
}

/// Shift that makes a Lennard-Jones potential vanish at `cutoff`.
#[inline]
pub fn lennard_jones_auto_shift(epsilon: f64, sigma: f64, cutoff: f64) -> f64 {
    let sr6 = (sigma / cutoff).powi(6);
    -4.0 * epsilon * (sr6 * sr6 - sr6)
}

/// Cutoff of the WCA potential, at the minimum of the Lennard-Jones curve.
#[inline]
pub fn wca_cutoff(sigma: f64) -> f64 {
    sigma * 2f64.powf(1.0 / 6.0)
}

/// Weeks-Chandler-Andersen potential: Lennard-Jones cut at its minimum and lifted by `epsilon`.
#[inline]
pub fn wca(dist: f64, epsilon: f64, sigma: f64) -> PairTerm {
    lennard_jones(dist, epsilon, sigma, wca_cutoff(sigma), epsilon)
}

/// FENE spring. Returns `None` once the bond is stretched to or beyond `d_r_max`.
#[inline]
pub fn fene(dist: f64, k: f64, d_r_max: f64, r_0: f64) -> Option<PairTerm> {
    let dr = dist - r_0;
    let ratio = dr / d_r_max;
    let rel = 1.0 - ratio * ratio;
    if rel <= 0.0 {
        return None;
    }
    Some(PairTerm {
        energy: -0.5 * k * d_r_max * d_r_max * rel.ln(),
        force: -k * dr / rel,
    })
}

/// Harmonic spring with rest length `r_0`.
#[inline]
pub fn harmonic(dist: f64, k: f64, r_0: f64) -> PairTerm {
    let dr = dist - r_0;
    PairTerm {
        energy: 0.5 * k * dr * dr,
        force: -k * dr,
    }
}
