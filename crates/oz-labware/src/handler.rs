//! The hardware capability that plans run against.

use crate::error::LabwareResult;
use crate::location::Location;
use crate::pipette::{Mount, PipetteModel};
use oz_core::LabwareId;
use oz_core::units::{Volume, in_ul};

/// Tip handling for compound liquid-handling commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TipStrategy {
    /// Use the tip already on the pipette.
    #[default]
    Never,
    /// Fresh tip for every aspirate/dispense cycle.
    Always,
    /// One fresh tip for the whole command.
    Once,
}

/// A liquid-handling robot.
///
/// Every method is a blocking physical action. Implementations are injected
/// into the executor; there is no process-wide robot handle.
pub trait LiquidHandler {
    /// Name for logs and reports.
    fn name(&self) -> &str;

    /// Move to a known physical state.
    fn home(&mut self) -> LabwareResult<()>;

    /// Place labware of `kind` (e.g. `96-flat`, `trough-12row`) in a deck slot.
    fn load_labware(&mut self, kind: &str, slot: u8) -> LabwareResult<LabwareId>;

    /// Attach a pipette drawing tips from `tip_racks`.
    fn load_pipette(
        &mut self,
        model: PipetteModel,
        mount: Mount,
        tip_racks: &[LabwareId],
    ) -> LabwareResult<()>;

    /// Model attached to `mount`.
    fn pipette(&self, mount: Mount) -> LabwareResult<PipetteModel>;

    fn pick_up_tip(&mut self, mount: Mount) -> LabwareResult<()>;

    fn drop_tip(&mut self, mount: Mount) -> LabwareResult<()>;

    /// Draw `volume` at `rate` (fraction of the default flow rate).
    fn aspirate(
        &mut self,
        mount: Mount,
        volume: Volume,
        location: &Location,
        rate: f64,
    ) -> LabwareResult<()>;

    fn dispense(
        &mut self,
        mount: Mount,
        volume: Volume,
        location: &Location,
        rate: f64,
    ) -> LabwareResult<()>;

    fn blow_out(&mut self, mount: Mount, location: &Location) -> LabwareResult<()>;

    /// Move `volume` from `source` to `dest`.
    ///
    /// Volumes above the pipette's capacity are split into equal trips.
    fn transfer(
        &mut self,
        mount: Mount,
        volume: Volume,
        source: &Location,
        dest: &Location,
        new_tip: TipStrategy,
    ) -> LabwareResult<()> {
        let trips = trip_count(volume, self.pipette(mount)?.max_volume());
        let per_trip = volume / trips as f64;

        if new_tip == TipStrategy::Once {
            self.pick_up_tip(mount)?;
        }
        for _ in 0..trips {
            if new_tip == TipStrategy::Always {
                self.pick_up_tip(mount)?;
            }
            self.aspirate(mount, per_trip, source, 1.0)?;
            self.dispense(mount, per_trip, dest, 1.0)?;
            if new_tip == TipStrategy::Always {
                self.drop_tip(mount)?;
            }
        }
        if new_tip == TipStrategy::Once {
            self.drop_tip(mount)?;
        }
        Ok(())
    }

    /// Deliver `volume` from `source` into each destination at `rate`.
    fn distribute(
        &mut self,
        mount: Mount,
        volume: Volume,
        source: &Location,
        dests: &[Location],
        rate: f64,
        new_tip: TipStrategy,
    ) -> LabwareResult<()> {
        if new_tip != TipStrategy::Never {
            self.pick_up_tip(mount)?;
        }
        for dest in dests {
            self.aspirate(mount, volume, source, rate)?;
            self.dispense(mount, volume, dest, rate)?;
        }
        if new_tip != TipStrategy::Never {
            self.drop_tip(mount)?;
        }
        Ok(())
    }
}

fn trip_count(volume: Volume, max: Volume) -> usize {
    let max_ul = in_ul(max);
    if max_ul <= 0.0 {
        return 1;
    }
    // tolerate conversion noise right at capacity
    let trips = (in_ul(volume) / max_ul - 1e-9).ceil();
    trips.max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use oz_core::units::ul;

    #[test]
    fn trips_split_above_capacity() {
        assert_eq!(trip_count(ul(292.5), ul(300.0)), 1);
        assert_eq!(trip_count(ul(300.0), ul(300.0)), 1);
        assert_eq!(trip_count(ul(301.0), ul(300.0)), 2);
        assert_eq!(trip_count(ul(900.0), ul(300.0)), 3);
        assert_eq!(trip_count(ul(0.0), ul(300.0)), 1);
    }
}
