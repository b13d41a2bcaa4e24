use thiserror::Error;

use super::config::ConfigError;
use super::features::Feature;
use super::state::WarmupPhase;
use crate::core::analysis::AnalysisError;
use crate::core::forcefield::evaluation::EvaluationError;
use crate::core::forcefield::params::ParamError;
use crate::core::io::OutputError;
use crate::core::models::simulation_box::BoxError;
use crate::core::models::system::SystemError;
use crate::core::placement::PlacementError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Required engine features are missing: {}", join_features(.missing))]
    MissingFeatures { missing: Vec<Feature> },

    #[error("Invalid interaction parameter: {source}")]
    Parameter {
        #[from]
        source: ParamError,
    },

    #[error("Invalid simulation box: {source}")]
    Domain {
        #[from]
        source: BoxError,
    },

    #[error("Invalid topology: {source}")]
    Topology {
        #[from]
        source: SystemError,
    },

    #[error("Force evaluation failed: {source}")]
    Evaluation {
        #[from]
        source: EvaluationError,
    },

    #[error("Analysis failed: {source}")]
    Analysis {
        #[from]
        source: AnalysisError,
    },

    #[error("Particle placement failed: {source}")]
    Placement {
        #[from]
        source: PlacementError,
    },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Writing run output failed: {source}")]
    Output {
        #[from]
        source: OutputError,
    },

    #[error("Invalid control value '{name}': {value}")]
    InvalidControl { name: &'static str, value: f64 },

    #[error("Integration became unstable at t={time:.4}: non-finite {quantity}")]
    Unstable { time: f64, quantity: &'static str },

    #[error("Illegal warmup transition from {from} to {to}")]
    PhaseTransition { from: WarmupPhase, to: WarmupPhase },

    #[error("Internal logic error: {0}")]
    Internal(String),
}

fn join_features(features: &[Feature]) -> String {
    features
        .iter()
        .map(Feature::name)
        .collect::<Vec<_>>()
        .join(", ")
}
