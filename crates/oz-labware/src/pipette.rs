//! Pipette models, mounts and the volume-based selection policy.

use std::fmt;

use crate::error::LabwareError;
use oz_core::units::{Volume, in_ul, ul};

/// Pipette mount on the robot gantry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mount {
    Left,
    Right,
}

impl Mount {
    pub fn key(&self) -> &'static str {
        match self {
            Mount::Left => "left",
            Mount::Right => "right",
        }
    }
}

impl fmt::Display for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Mount {
    type Err = LabwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Mount::Left),
            "right" => Ok(Mount::Right),
            other => Err(LabwareError::InvalidArg {
                what: format!("unknown mount '{other}'"),
            }),
        }
    }
}

/// Single-channel pipettes used by the protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipetteModel {
    /// 5-50 uL
    P50Single,
    /// 30-300 uL
    P300Single,
    /// 100-1000 uL
    P1000Single,
}

impl PipetteModel {
    pub fn key(&self) -> &'static str {
        match self {
            PipetteModel::P50Single => "p50_single",
            PipetteModel::P300Single => "p300_single",
            PipetteModel::P1000Single => "p1000_single",
        }
    }

    pub fn min_volume(&self) -> Volume {
        match self {
            PipetteModel::P50Single => ul(5.0),
            PipetteModel::P300Single => ul(30.0),
            PipetteModel::P1000Single => ul(100.0),
        }
    }

    pub fn max_volume(&self) -> Volume {
        match self {
            PipetteModel::P50Single => ul(50.0),
            PipetteModel::P300Single => ul(300.0),
            PipetteModel::P1000Single => ul(1000.0),
        }
    }
}

impl fmt::Display for PipetteModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for PipetteModel {
    type Err = LabwareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p50_single" | "p50" => Ok(PipetteModel::P50Single),
            "p300_single" | "p300" => Ok(PipetteModel::P300Single),
            "p1000_single" | "p1000" => Ok(PipetteModel::P1000Single),
            other => Err(LabwareError::InvalidArg {
                what: format!("unknown pipette model '{other}'"),
            }),
        }
    }
}

/// Which of the two dispensing pipettes a volume calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipetteClass {
    LowVolume,
    HighVolume,
}

/// Mounts carrying the low- and high-volume pipettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipettePair {
    pub low: Mount,
    pub high: Mount,
}

impl PipettePair {
    pub fn mount(&self, class: PipetteClass) -> Mount {
        match class {
            PipetteClass::LowVolume => self.low,
            PipetteClass::HighVolume => self.high,
        }
    }
}

impl Default for PipettePair {
    /// P50 on the right, P300 on the left.
    fn default() -> Self {
        Self {
            low: Mount::Right,
            high: Mount::Left,
        }
    }
}

/// Volume threshold between the two pipettes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Volumes strictly below this go to the low-volume pipette.
    pub low_volume_instrument_max: Volume,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            low_volume_instrument_max: ul(30.0),
        }
    }
}

impl SelectionPolicy {
    /// `None` for a zero volume: that well is skipped.
    pub fn select(&self, volume: Volume) -> Option<PipetteClass> {
        let v = in_ul(volume);
        if v == 0.0 {
            None
        } else if v < in_ul(self.low_volume_instrument_max) {
            Some(PipetteClass::LowVolume)
        } else {
            Some(PipetteClass::HighVolume)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive_to_high() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.select(ul(0.0)), None);
        assert_eq!(policy.select(ul(29.999)), Some(PipetteClass::LowVolume));
        assert_eq!(policy.select(ul(30.0)), Some(PipetteClass::HighVolume));
        assert_eq!(policy.select(ul(292.5)), Some(PipetteClass::HighVolume));
    }

    #[test]
    fn configured_threshold() {
        let policy = SelectionPolicy {
            low_volume_instrument_max: ul(50.0),
        };
        assert_eq!(policy.select(ul(45.0)), Some(PipetteClass::LowVolume));
    }

    #[test]
    fn parse_models_and_mounts() {
        assert_eq!("P300".parse::<PipetteModel>().unwrap(), PipetteModel::P300Single);
        assert_eq!("p1000_single".parse::<PipetteModel>().unwrap(), PipetteModel::P1000Single);
        assert!("p20".parse::<PipetteModel>().is_err());
        assert_eq!("Left".parse::<Mount>().unwrap(), Mount::Left);
        assert!("center".parse::<Mount>().is_err());
    }

    #[test]
    fn default_pair_matches_deck() {
        let pair = PipettePair::default();
        assert_eq!(pair.mount(PipetteClass::LowVolume), Mount::Right);
        assert_eq!(pair.mount(PipetteClass::HighVolume), Mount::Left);
    }
}
