//! oz-labware: well-plate allocation and dispensing plans for a liquid-handling robot.
//!
//! Provides:
//! - `locate`: maps a running trial index onto (plate, offset) across 96-well plates
//! - `plan`: turns reagent pairs and volume lists into an ordered list of `Action`s
//! - `LiquidHandler`: the hardware capability the plans run against
//! - `execute`: runs a plan action by action, aborting on the first failure
//! - `SimulatedHandler`: in-memory robot used for dry runs and tests
//! - `SpeedSweep`: pipette flow-rate calibration
//!
//! # Architecture
//!
//! Planning is pure: nothing touches hardware until `execute` is handed a
//! plan and a handler. Capacity problems are therefore reported before the
//! first tip is picked up.
//!
//! # Example
//!
//! ```
//! use oz_core::{LabwareId, ul};
//! use oz_labware::{DispenseConfig, ReagentPair, plan};
//!
//! let trough = LabwareId::from_index(0);
//! let plates = [LabwareId::from_index(1), LabwareId::from_index(2)];
//! let pairs = [ReagentPair::new("A1", "A5")];
//! let volumes = [vec![ul(7.5), ul(150.0)], vec![ul(292.5), ul(150.0)]];
//!
//! let plan = plan(&pairs, &volumes, 0, &plates, trough, &DispenseConfig::default()).unwrap();
//! assert_eq!(plan.wells_used, 2);
//! ```

pub mod calibration;
pub mod error;
pub mod executor;
pub mod handler;
pub mod location;
pub mod pipette;
pub mod plan;
pub mod plate;
pub mod simulated;

// Re-exports
pub use calibration::SpeedSweep;
pub use error::{LabwareError, LabwareResult};
pub use executor::{ExecutionReport, execute};
pub use handler::{LiquidHandler, TipStrategy};
pub use location::{Location, Well};
pub use pipette::{Mount, PipetteClass, PipetteModel, PipettePair, SelectionPolicy};
pub use plan::{Action, DispenseConfig, DispensePlan, ReagentPair, TipReuse, plan};
pub use plate::{PLATE_CAPACITY, PLATE_ROWS, locate, locate_in, well_name};
pub use simulated::{HardwareCall, SimulatedHandler};
