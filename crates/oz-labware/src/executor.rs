//! Runs planned actions against a liquid handler.

use tracing::{debug, info, warn};

use crate::error::{LabwareError, LabwareResult};
use crate::handler::LiquidHandler;
use crate::plan::Action;

/// Outcome of a completed execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    pub actions_completed: usize,
    pub transfers: usize,
    pub volume_dispensed_ul: f64,
}

/// Run `actions` in order.
///
/// The first failing action aborts the rest. Nothing is rolled back:
/// liquid already dispensed stays in its wells, and the error reports how
/// many actions completed.
pub fn execute<H>(actions: &[Action], handler: &mut H) -> LabwareResult<ExecutionReport>
where
    H: LiquidHandler + ?Sized,
{
    info!(handler = handler.name(), actions = actions.len(), "executing plan");

    let mut report = ExecutionReport::default();
    for action in actions {
        debug!(%action, "action");
        if let Err(err) = apply(action, handler) {
            warn!(
                completed = report.actions_completed,
                %action,
                error = %err,
                "execution aborted"
            );
            return Err(LabwareError::Aborted {
                completed: report.actions_completed,
                action: action.to_string(),
                source: Box::new(err),
            });
        }
        report.actions_completed += 1;
        if matches!(action, Action::Transfer { .. }) {
            report.transfers += 1;
        }
        report.volume_dispensed_ul += action.delivered_ul();
    }

    info!(
        transfers = report.transfers,
        volume_ul = report.volume_dispensed_ul,
        "plan complete"
    );
    Ok(report)
}

fn apply<H>(action: &Action, handler: &mut H) -> LabwareResult<()>
where
    H: LiquidHandler + ?Sized,
{
    match action {
        Action::PickUpTip { mount } => handler.pick_up_tip(*mount),
        Action::DropTip { mount } => handler.drop_tip(*mount),
        Action::Aspirate {
            mount,
            volume,
            location,
            rate,
        } => handler.aspirate(*mount, *volume, location, *rate),
        Action::Dispense {
            mount,
            volume,
            location,
            rate,
        } => handler.dispense(*mount, *volume, location, *rate),
        Action::Transfer {
            mount,
            volume,
            source,
            dest,
            new_tip,
        } => handler.transfer(*mount, *volume, source, dest, *new_tip),
        Action::Distribute {
            mount,
            volume,
            source,
            dests,
            rate,
            new_tip,
        } => handler.distribute(*mount, *volume, source, dests, *rate, *new_tip),
        Action::BlowOut { mount, location } => handler.blow_out(*mount, location),
    }
}
