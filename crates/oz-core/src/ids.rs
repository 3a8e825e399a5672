use core::fmt;
use core::num::NonZeroU32;

/// Compact handle for an object placed on the robot deck.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<Id>` to be pointer-optimized
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Create an Id from a 0-based index by storing index+1.
    ///
    /// Indices saturate at `u32::MAX - 1`; a deck never holds that many items.
    pub fn from_index(index: u32) -> Self {
        let stored = index.saturating_add(1);
        match NonZeroU32::new(stored) {
            Some(nz) => Self(nz),
            None => Self(NonZeroU32::MIN),
        }
    }

    /// Recover the 0-based index.
    pub fn index(self) -> u32 {
        self.0.get() - 1
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Handle returned when a plate, trough, vial rack or tip rack is loaded.
pub type LabwareId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 11, 10_000] {
            let id = Id::from_index(i);
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }

    #[test]
    fn max_index_saturates() {
        let id = Id::from_index(u32::MAX);
        assert_eq!(id.index(), u32::MAX - 1);
    }
}
