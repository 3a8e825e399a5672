//! Well-plate allocation across a sequence of 96-well plates.

use crate::error::{LabwareError, LabwareResult};

/// Wells per plate.
pub const PLATE_CAPACITY: usize = 96;

/// Rows per plate (A-H).
pub const PLATE_ROWS: usize = 8;

/// Plate and in-plate offset for a running trial index, 96-well plates.
pub fn locate<P>(trial_index: usize, plates: &[P]) -> LabwareResult<(&P, usize)> {
    locate_in(trial_index, plates, PLATE_CAPACITY)
}

/// Plate and in-plate offset for a running trial index.
///
/// Plate index is `trial_index / capacity`, offset is `trial_index % capacity`.
/// Running past the last plate is a capacity error, never a wrap.
pub fn locate_in<P>(
    trial_index: usize,
    plates: &[P],
    capacity: usize,
) -> LabwareResult<(&P, usize)> {
    if capacity == 0 {
        return Err(LabwareError::InvalidArg {
            what: "plate capacity must be positive".into(),
        });
    }
    let plate_index = trial_index / capacity;
    let offset = trial_index % capacity;
    plates
        .get(plate_index)
        .map(|plate| (plate, offset))
        .ok_or(LabwareError::Capacity {
            trial_index,
            plate_index,
            plates: plates.len(),
        })
}

/// Well name for an offset, counting down columns first: A1, B1, ..., H1, A2, ...
pub fn well_name(offset: usize) -> String {
    let row = (b'A' + (offset % PLATE_ROWS) as u8) as char;
    let column = offset / PLATE_ROWS + 1;
    format!("{row}{column}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trial_250_lands_on_third_plate() {
        let plates = ["P0", "P1", "P2", "P3"];
        let (plate, offset) = locate(250, &plates).unwrap();
        assert_eq!(*plate, "P2");
        assert_eq!(offset, 58);
    }

    #[test]
    fn plate_edges() {
        let plates = ["P0", "P1"];
        assert_eq!(locate(0, &plates).unwrap(), (&"P0", 0));
        assert_eq!(locate(95, &plates).unwrap(), (&"P0", 95));
        assert_eq!(locate(96, &plates).unwrap(), (&"P1", 0));
        assert_eq!(locate(191, &plates).unwrap(), (&"P1", 95));
    }

    #[test]
    fn past_last_plate_is_capacity_error() {
        let plates = ["P0", "P1"];
        let err = locate(192, &plates).unwrap_err();
        assert_eq!(
            err,
            LabwareError::Capacity {
                trial_index: 192,
                plate_index: 2,
                plates: 2,
            }
        );
    }

    #[test]
    fn no_plates_no_wells() {
        let plates: [&str; 0] = [];
        assert!(locate(0, &plates).is_err());
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(locate_in(0, &["P0"], 0).is_err());
    }

    #[test]
    fn well_names_go_down_columns() {
        assert_eq!(well_name(0), "A1");
        assert_eq!(well_name(7), "H1");
        assert_eq!(well_name(8), "A2");
        assert_eq!(well_name(58), "C8");
        assert_eq!(well_name(95), "H12");
    }
}
