//! Addressing wells on loaded labware.

use std::fmt;

use oz_core::LabwareId;
use oz_core::units::{Length, mm};

/// A named well on a piece of labware (plate well, trough row, vial).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Well {
    pub labware: LabwareId,
    pub name: String,
}

impl Well {
    pub fn new(labware: LabwareId, name: impl Into<String>) -> Self {
        Self {
            labware,
            name: name.into(),
        }
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.labware)
    }
}

/// Where the pipette goes inside a well.
///
/// `top_offset` of `None` means the handler's default height.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub well: Well,
    pub top_offset: Option<Length>,
}

impl Location {
    pub fn at(well: Well) -> Self {
        Self {
            well,
            top_offset: None,
        }
    }

    /// Above the top of the well by `offset`.
    pub fn top(well: Well, offset: Length) -> Self {
        Self {
            well,
            top_offset: Some(offset),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.top_offset {
            Some(offset) => {
                let offset_mm = offset.get::<uom::si::length::millimeter>();
                write!(f, "{} (top {:+.1} mm)", self.well, offset_mm)
            }
            None => write!(f, "{}", self.well),
        }
    }
}

/// Default dispense height above the well top.
pub fn default_top_offset() -> Length {
    mm(0.5)
}
