//! Error types for the rhythm engine.
//!
//! Only caller contract violations surface as errors. Gameplay failures such
//! as missed parries, stale owners or double resolutions degrade to no-ops.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RhythmError {
    /// `request_combo` was handed a beat list it cannot schedule.
    #[error("invalid combo spec: {0}")]
    InvalidSpec(SpecViolation),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpecViolation {
    #[error("combo has no beats")]
    EmptyCombo,

    #[error("beat {index} has travel duration {travel_duration}, expected a finite value > 0")]
    TravelDuration { index: usize, travel_duration: f32 },

    #[error("beat {index} has penalty value {penalty_value}, expected a finite value >= 0")]
    PenaltyValue { index: usize, penalty_value: f32 },
}

impl From<SpecViolation> for RhythmError {
    fn from(v: SpecViolation) -> Self {
        Self::InvalidSpec(v)
    }
}

/// Failure to load a scripted combo list for the simulation.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("failed to read combo script: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed combo script: {0}")]
    Format(#[from] serde_json::Error),

    #[error("combo script holds no combos")]
    Empty,
}
