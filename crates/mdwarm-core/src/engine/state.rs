use std::fmt;

/// Phase of the warmup state machine.
///
/// ```text
/// Warming ──(criterion met / budget spent)──▶ Relaxing ──(relaxation done)──▶ Ready
///    │                                                                      ▲
///    └──────────────(no ramp, or nothing was ramped)────────────────────────┘
/// ```
///
/// Phases only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarmupPhase {
    /// Control parameter is being adjusted between integration bursts.
    Warming,
    /// Force cap removed; a fixed number of relaxation steps is running.
    Relaxing,
    /// Handed over to production.
    Ready,
}

impl WarmupPhase {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: WarmupPhase) -> bool {
        matches!(
            (self, next),
            (WarmupPhase::Warming, WarmupPhase::Warming)
                | (WarmupPhase::Warming, WarmupPhase::Relaxing)
                | (WarmupPhase::Warming, WarmupPhase::Ready)
                | (WarmupPhase::Relaxing, WarmupPhase::Ready)
        )
    }
}

impl fmt::Display for WarmupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WarmupPhase::Warming => "WARMING",
            WarmupPhase::Relaxing => "RELAXING",
            WarmupPhase::Ready => "READY",
        })
    }
}

/// Value of the warmup control parameter during one burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    ForceCap(f64),
    None,
}

impl fmt::Display for ControlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlValue::ForceCap(cap) => write!(f, "force cap {cap:.6}"),
            ControlValue::None => f.write_str("no control parameter"),
        }
    }
}

/// Progress record emitted before each warmup burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarmupRecord {
    pub iteration: usize,
    pub min_distance: f64,
    pub control: ControlValue,
    pub total_energy: f64,
}

impl fmt::Display for WarmupRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "warmup {}: min_dist {:.6}, {}, energy {:+.2e}",
            self.iteration, self.min_distance, self.control, self.total_energy
        )
    }
}

/// Result of a warmup run. Non-convergence is reported here, never raised.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmupOutcome {
    pub converged: bool,
    /// Number of warming bursts performed.
    pub iterations: usize,
    /// Integration steps performed across all phases.
    pub integration_steps: u64,
    pub final_min_distance: f64,
    pub final_phase: WarmupPhase,
    pub records: Vec<WarmupRecord>,
}
