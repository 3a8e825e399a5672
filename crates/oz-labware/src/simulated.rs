//! In-memory liquid handler for dry runs and tests.

use std::collections::BTreeMap;

use crate::error::{LabwareError, LabwareResult};
use crate::handler::LiquidHandler;
use crate::location::{Location, Well};
use crate::pipette::{Mount, PipetteModel};
use oz_core::LabwareId;
use oz_core::units::{Volume, in_ul};

/// Deck slots on the robot.
const DECK_SLOTS: std::ops::RangeInclusive<u8> = 1..=11;

/// Slack allowed on volume bookkeeping (uL).
const VOLUME_EPS_UL: f64 = 1e-6;

/// Record of one hardware call, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum HardwareCall {
    Home,
    LoadLabware {
        kind: String,
        slot: u8,
        id: LabwareId,
    },
    LoadPipette {
        model: PipetteModel,
        mount: Mount,
    },
    PickUpTip(Mount),
    DropTip(Mount),
    Aspirate {
        mount: Mount,
        volume_ul: f64,
        well: Well,
        rate: f64,
    },
    Dispense {
        mount: Mount,
        volume_ul: f64,
        well: Well,
        rate: f64,
    },
    BlowOut {
        mount: Mount,
        well: Well,
    },
}

#[derive(Debug, Clone)]
struct PipetteState {
    model: PipetteModel,
    has_tip: bool,
    held_ul: f64,
    tips_used: usize,
}

#[derive(Debug, Clone)]
struct LoadedLabware {
    kind: String,
    slot: u8,
}

/// Simulated robot that validates tip state and pipette ranges and keeps
/// track of the liquid delivered to every well.
#[derive(Debug, Clone, Default)]
pub struct SimulatedHandler {
    homed: bool,
    labware: Vec<LoadedLabware>,
    pipettes: BTreeMap<Mount, PipetteState>,
    delivered_ul: BTreeMap<Well, f64>,
    log: Vec<HardwareCall>,
}

impl SimulatedHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> &[HardwareCall] {
        &self.log
    }

    /// Total liquid dispensed into `well` so far (uL).
    pub fn delivered_ul(&self, well: &Well) -> f64 {
        self.delivered_ul.get(well).copied().unwrap_or(0.0)
    }

    /// Every well that received liquid, with its total (uL).
    pub fn deliveries(&self) -> impl Iterator<Item = (&Well, f64)> {
        self.delivered_ul.iter().map(|(well, v)| (well, *v))
    }

    pub fn tips_used(&self, mount: Mount) -> usize {
        self.pipettes.get(&mount).map(|p| p.tips_used).unwrap_or(0)
    }

    pub fn has_tip(&self, mount: Mount) -> bool {
        self.pipettes.get(&mount).is_some_and(|p| p.has_tip)
    }

    /// Kind and slot of a loaded labware handle.
    pub fn labware(&self, id: LabwareId) -> Option<(&str, u8)> {
        self.labware
            .get(id.index() as usize)
            .map(|l| (l.kind.as_str(), l.slot))
    }

    fn require_homed(&self) -> LabwareResult<()> {
        if self.homed {
            Ok(())
        } else {
            Err(LabwareError::Hardware {
                message: "robot must be homed before moving".into(),
            })
        }
    }

    fn require_labware(&self, well: &Well) -> LabwareResult<()> {
        if (well.labware.index() as usize) < self.labware.len() {
            Ok(())
        } else {
            Err(LabwareError::Hardware {
                message: format!("labware {} is not loaded", well.labware),
            })
        }
    }

    fn tipped(&mut self, mount: Mount) -> LabwareResult<&mut PipetteState> {
        self.require_homed()?;
        let state = self.pipette_state(mount)?;
        if !state.has_tip {
            return Err(LabwareError::TipState {
                mount,
                what: "no tip attached",
            });
        }
        Ok(state)
    }

    fn pipette_state(&mut self, mount: Mount) -> LabwareResult<&mut PipetteState> {
        self.pipettes
            .get_mut(&mount)
            .ok_or_else(|| LabwareError::Hardware {
                message: format!("no pipette on {mount} mount"),
            })
    }
}

impl LiquidHandler for SimulatedHandler {
    fn name(&self) -> &str {
        "simulated"
    }

    fn home(&mut self) -> LabwareResult<()> {
        self.homed = true;
        self.log.push(HardwareCall::Home);
        Ok(())
    }

    fn load_labware(&mut self, kind: &str, slot: u8) -> LabwareResult<LabwareId> {
        if !DECK_SLOTS.contains(&slot) {
            return Err(LabwareError::InvalidArg {
                what: format!("deck slot {slot} does not exist"),
            });
        }
        if let Some(existing) = self.labware.iter().find(|l| l.slot == slot) {
            return Err(LabwareError::Hardware {
                message: format!("slot {slot} already holds {}", existing.kind),
            });
        }
        let id = LabwareId::from_index(self.labware.len() as u32);
        self.labware.push(LoadedLabware {
            kind: kind.to_string(),
            slot,
        });
        self.log.push(HardwareCall::LoadLabware {
            kind: kind.to_string(),
            slot,
            id,
        });
        Ok(id)
    }

    fn load_pipette(
        &mut self,
        model: PipetteModel,
        mount: Mount,
        tip_racks: &[LabwareId],
    ) -> LabwareResult<()> {
        if self.pipettes.contains_key(&mount) {
            return Err(LabwareError::Hardware {
                message: format!("{mount} mount already has a pipette"),
            });
        }
        if let Some(missing) = tip_racks
            .iter()
            .find(|rack| rack.index() as usize >= self.labware.len())
        {
            return Err(LabwareError::Hardware {
                message: format!("tip rack {missing} is not loaded"),
            });
        }
        self.pipettes.insert(
            mount,
            PipetteState {
                model,
                has_tip: false,
                held_ul: 0.0,
                tips_used: 0,
            },
        );
        self.log.push(HardwareCall::LoadPipette { model, mount });
        Ok(())
    }

    fn pipette(&self, mount: Mount) -> LabwareResult<PipetteModel> {
        self.pipettes
            .get(&mount)
            .map(|p| p.model)
            .ok_or_else(|| LabwareError::Hardware {
                message: format!("no pipette on {mount} mount"),
            })
    }

    fn pick_up_tip(&mut self, mount: Mount) -> LabwareResult<()> {
        self.require_homed()?;
        let state = self.pipette_state(mount)?;
        if state.has_tip {
            return Err(LabwareError::TipState {
                mount,
                what: "tip already attached",
            });
        }
        state.has_tip = true;
        state.tips_used += 1;
        self.log.push(HardwareCall::PickUpTip(mount));
        Ok(())
    }

    fn drop_tip(&mut self, mount: Mount) -> LabwareResult<()> {
        let state = self.tipped(mount)?;
        state.has_tip = false;
        state.held_ul = 0.0;
        self.log.push(HardwareCall::DropTip(mount));
        Ok(())
    }

    fn aspirate(
        &mut self,
        mount: Mount,
        volume: Volume,
        location: &Location,
        rate: f64,
    ) -> LabwareResult<()> {
        self.require_labware(&location.well)?;
        let volume_ul = in_ul(volume);
        let state = self.tipped(mount)?;
        let min_ul = in_ul(state.model.min_volume());
        let max_ul = in_ul(state.model.max_volume());
        if volume_ul < min_ul - VOLUME_EPS_UL || state.held_ul + volume_ul > max_ul + VOLUME_EPS_UL
        {
            return Err(LabwareError::VolumeRange {
                mount,
                volume_ul,
                min_ul,
                max_ul,
            });
        }
        state.held_ul += volume_ul;
        self.log.push(HardwareCall::Aspirate {
            mount,
            volume_ul,
            well: location.well.clone(),
            rate,
        });
        Ok(())
    }

    fn dispense(
        &mut self,
        mount: Mount,
        volume: Volume,
        location: &Location,
        rate: f64,
    ) -> LabwareResult<()> {
        self.require_labware(&location.well)?;
        let volume_ul = in_ul(volume);
        let state = self.tipped(mount)?;
        if volume_ul > state.held_ul + VOLUME_EPS_UL {
            return Err(LabwareError::Hardware {
                message: format!(
                    "cannot dispense {volume_ul} uL, {mount} pipette holds {} uL",
                    state.held_ul
                ),
            });
        }
        state.held_ul = (state.held_ul - volume_ul).max(0.0);
        *self
            .delivered_ul
            .entry(location.well.clone())
            .or_insert(0.0) += volume_ul;
        self.log.push(HardwareCall::Dispense {
            mount,
            volume_ul,
            well: location.well.clone(),
            rate,
        });
        Ok(())
    }

    fn blow_out(&mut self, mount: Mount, location: &Location) -> LabwareResult<()> {
        self.require_labware(&location.well)?;
        let state = self.tipped(mount)?;
        state.held_ul = 0.0;
        self.log.push(HardwareCall::BlowOut {
            mount,
            well: location.well.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::TipStrategy;
    use oz_core::units::ul;

    fn rig() -> (SimulatedHandler, LabwareId, LabwareId) {
        let mut robot = SimulatedHandler::new();
        robot.home().unwrap();
        let tips = robot.load_labware("opentrons-tiprack-300ul", 10).unwrap();
        let trough = robot.load_labware("trough-12row", 7).unwrap();
        let plate = robot.load_labware("96-flat", 8).unwrap();
        robot
            .load_pipette(PipetteModel::P300Single, Mount::Left, &[tips])
            .unwrap();
        (robot, trough, plate)
    }

    #[test]
    fn transfer_moves_liquid() {
        let (mut robot, trough, plate) = rig();
        let source = Location::at(Well::new(trough, "A1"));
        let dest = Location::at(Well::new(plate, "A1"));

        robot.pick_up_tip(Mount::Left).unwrap();
        robot
            .transfer(Mount::Left, ul(150.0), &source, &dest, TipStrategy::Never)
            .unwrap();
        robot.drop_tip(Mount::Left).unwrap();

        assert!((robot.delivered_ul(&dest.well) - 150.0).abs() < 1e-9);
        assert_eq!(robot.tips_used(Mount::Left), 1);
    }

    #[test]
    fn large_transfer_is_split() {
        let (mut robot, trough, plate) = rig();
        let source = Location::at(Well::new(trough, "A1"));
        let dest = Location::at(Well::new(plate, "B1"));

        robot
            .transfer(Mount::Left, ul(450.0), &source, &dest, TipStrategy::Once)
            .unwrap();

        let aspirates = robot
            .log()
            .iter()
            .filter(|c| matches!(c, HardwareCall::Aspirate { .. }))
            .count();
        assert_eq!(aspirates, 2);
        assert!((robot.delivered_ul(&dest.well) - 450.0).abs() < 1e-9);
        assert!(!robot.has_tip(Mount::Left));
    }

    #[test]
    fn double_pick_up_fails() {
        let (mut robot, _, _) = rig();
        robot.pick_up_tip(Mount::Left).unwrap();
        let err = robot.pick_up_tip(Mount::Left).unwrap_err();
        assert!(matches!(err, LabwareError::TipState { .. }));
    }

    #[test]
    fn aspirate_without_tip_fails() {
        let (mut robot, trough, _) = rig();
        let source = Location::at(Well::new(trough, "A1"));
        let err = robot
            .aspirate(Mount::Left, ul(100.0), &source, 1.0)
            .unwrap_err();
        assert!(matches!(err, LabwareError::TipState { .. }));
    }

    #[test]
    fn below_minimum_volume_fails() {
        let (mut robot, trough, _) = rig();
        let source = Location::at(Well::new(trough, "A1"));
        robot.pick_up_tip(Mount::Left).unwrap();
        let err = robot
            .aspirate(Mount::Left, ul(10.0), &source, 1.0)
            .unwrap_err();
        assert!(matches!(err, LabwareError::VolumeRange { .. }));
    }

    #[test]
    fn must_home_first() {
        let mut robot = SimulatedHandler::new();
        let tips = robot.load_labware("opentrons-tiprack-300ul", 10).unwrap();
        robot
            .load_pipette(PipetteModel::P50Single, Mount::Right, &[tips])
            .unwrap();
        assert!(robot.pick_up_tip(Mount::Right).is_err());
    }

    #[test]
    fn slots_are_exclusive() {
        let (mut robot, _, _) = rig();
        assert!(robot.load_labware("96-flat", 8).is_err());
        assert!(robot.load_labware("96-flat", 12).is_err());
        assert_eq!(robot.labware(LabwareId::from_index(2)), Some(("96-flat", 8)));
    }
}
