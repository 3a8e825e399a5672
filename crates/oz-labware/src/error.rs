//! Error types for allocation, planning and hardware actions.

use crate::pipette::Mount;
use thiserror::Error;

/// Errors raised while planning or running dispensing actions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabwareError {
    /// Trial index runs past the last supplied plate.
    #[error("No free plate for trial index {trial_index} (plate {plate_index} requested, {plates} loaded)")]
    Capacity {
        trial_index: usize,
        plate_index: usize,
        plates: usize,
    },

    /// Plan needs more empty wells than the plates offer.
    #[error("Experiment needs {needed} empty wells but only {available} are available")]
    InsufficientWells { needed: usize, available: usize },

    #[error("Invalid volume lists: {what}")]
    InvalidVolumeLists { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Tip state error on {mount} pipette: {what}")]
    TipState { mount: Mount, what: &'static str },

    #[error("Volume {volume_ul} uL outside {min_ul}-{max_ul} uL range of {mount} pipette")]
    VolumeRange {
        mount: Mount,
        volume_ul: f64,
        min_ul: f64,
        max_ul: f64,
    },

    #[error("Hardware error: {message}")]
    Hardware { message: String },

    /// Execution stopped part way; already dispensed liquid stays where it is.
    #[error("Aborted after {completed} actions at `{action}`: {source}")]
    Aborted {
        completed: usize,
        action: String,
        source: Box<LabwareError>,
    },
}

pub type LabwareResult<T> = Result<T, LabwareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_trial() {
        let err = LabwareError::Capacity {
            trial_index: 400,
            plate_index: 4,
            plates: 4,
        };
        assert!(err.to_string().contains("trial index 400"));
    }

    #[test]
    fn aborted_keeps_source() {
        let err = LabwareError::Aborted {
            completed: 3,
            action: "drop tip (left)".into(),
            source: Box::new(LabwareError::Hardware {
                message: "door open".into(),
            }),
        };
        let source = std::error::Error::source(&err).map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("Hardware error: door open"));
    }
}
