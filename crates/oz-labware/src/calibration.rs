//! Pipette flow-rate calibration.
//!
//! The same volume is distributed from one source into a row of vials, one
//! vial per flow rate, so the delivered masses can be weighed and compared.

use crate::error::{LabwareError, LabwareResult};
use crate::handler::TipStrategy;
use crate::location::{Location, Well};
use crate::pipette::Mount;
use crate::plan::Action;
use oz_core::units::{Volume, in_ul};

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSweep {
    pub mount: Mount,
    pub source: Well,
    /// One destination per rate, in order.
    pub destinations: Vec<Well>,
    pub volume: Volume,
    /// Flow rates as fractions of the pipette's default rate.
    pub rates: Vec<f64>,
    /// Aspirate/dispense cycles at the source to wet the tip.
    pub prewet_cycles: usize,
}

impl SpeedSweep {
    /// Actions for the sweep: one tip, pre-wet, one distribute and blow-out per rate.
    pub fn actions(&self) -> LabwareResult<Vec<Action>> {
        let volume_ul = in_ul(self.volume);
        if !volume_ul.is_finite() || volume_ul <= 0.0 {
            return Err(LabwareError::InvalidArg {
                what: format!("calibration volume {volume_ul} uL must be positive"),
            });
        }
        if self.rates.is_empty() {
            return Err(LabwareError::InvalidArg {
                what: "calibration needs at least one flow rate".into(),
            });
        }
        if let Some(bad) = self.rates.iter().find(|r| !r.is_finite() || **r <= 0.0) {
            return Err(LabwareError::InvalidArg {
                what: format!("flow rate {bad} must be positive"),
            });
        }
        if self.destinations.len() < self.rates.len() {
            return Err(LabwareError::InvalidArg {
                what: format!(
                    "{} flow rates but only {} destination vials",
                    self.rates.len(),
                    self.destinations.len()
                ),
            });
        }

        let source = Location::at(self.source.clone());
        let mut actions = vec![Action::PickUpTip { mount: self.mount }];
        for _ in 0..self.prewet_cycles {
            actions.push(Action::Aspirate {
                mount: self.mount,
                volume: self.volume,
                location: source.clone(),
                rate: 1.0,
            });
            actions.push(Action::Dispense {
                mount: self.mount,
                volume: self.volume,
                location: source.clone(),
                rate: 1.0,
            });
        }
        for (rate, vial) in self.rates.iter().zip(&self.destinations) {
            let dest = Location::at(vial.clone());
            actions.push(Action::Distribute {
                mount: self.mount,
                volume: self.volume,
                source: source.clone(),
                dests: vec![dest.clone()],
                rate: *rate,
                new_tip: TipStrategy::Never,
            });
            actions.push(Action::BlowOut {
                mount: self.mount,
                location: dest,
            });
        }
        actions.push(Action::DropTip { mount: self.mount });
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oz_core::LabwareId;
    use oz_core::units::ul;

    fn sweep() -> SpeedSweep {
        let stock = LabwareId::from_index(1);
        let vials = LabwareId::from_index(2);
        SpeedSweep {
            mount: Mount::Right,
            source: Well::new(stock, "A1"),
            destinations: ["A1", "B1", "A2", "B2", "A3"]
                .into_iter()
                .map(|name| Well::new(vials, name))
                .collect(),
            volume: ul(600.0),
            rates: vec![0.2, 0.4, 0.6, 0.8, 1.0],
            prewet_cycles: 2,
        }
    }

    #[test]
    fn sweep_shape() {
        let actions = sweep().actions().unwrap();
        // tip + 2x(aspirate, dispense) + 5x(distribute, blow out) + drop
        assert_eq!(actions.len(), 1 + 4 + 10 + 1);
        assert_eq!(actions.first(), Some(&Action::PickUpTip { mount: Mount::Right }));
        assert_eq!(actions.last(), Some(&Action::DropTip { mount: Mount::Right }));

        let rates: Vec<f64> = actions
            .iter()
            .filter_map(|a| match a {
                Action::Distribute { rate, .. } => Some(*rate),
                _ => None,
            })
            .collect();
        assert_eq!(rates, vec![0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn too_few_vials() {
        let mut sweep = sweep();
        sweep.destinations.truncate(3);
        assert!(sweep.actions().is_err());
    }

    #[test]
    fn rates_must_be_positive() {
        let mut sweep = sweep();
        sweep.rates[0] = 0.0;
        assert!(sweep.actions().is_err());
    }
}
