//! Deck setup, dispensing plans, and execution against a liquid handler.

use std::collections::BTreeMap;

use oz_core::LabwareId;
use oz_core::units::{mm, ul};
use oz_labware::{
    DispenseConfig, DispensePlan, ExecutionReport, LiquidHandler, Mount, PipetteModel,
    PipettePair, ReagentPair, SelectionPolicy, SimulatedHandler, SpeedSweep, TipReuse, Well,
    execute, plan,
};
use oz_project::schema::{DispenseDef, ProtocolFile, TipReuseDef};
use tracing::info;

use crate::error::{AppError, AppResult};

/// Handles for everything the protocol put on the robot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckSetup {
    labware: BTreeMap<String, LabwareId>,
    pipettes: BTreeMap<String, (Mount, PipetteModel)>,
}

impl DeckSetup {
    pub fn labware(&self, id: &str) -> AppResult<LabwareId> {
        self.labware
            .get(id)
            .copied()
            .ok_or_else(|| AppError::InvalidInput(format!("labware '{id}' is not on the deck")))
    }

    pub fn mount(&self, pipette: &str) -> AppResult<Mount> {
        self.pipettes
            .get(pipette)
            .map(|(mount, _)| *mount)
            .ok_or_else(|| AppError::InvalidInput(format!("pipette '{pipette}' is not loaded")))
    }

    pub fn model(&self, pipette: &str) -> AppResult<PipetteModel> {
        self.pipettes
            .get(pipette)
            .map(|(_, model)| *model)
            .ok_or_else(|| AppError::InvalidInput(format!("pipette '{pipette}' is not loaded")))
    }
}

/// A dispensing run: the plan and what executing it achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub plan: DispensePlan,
    pub report: ExecutionReport,
}

/// Home the robot, then load the deck labware and pipettes in protocol order.
pub fn setup_deck<H>(protocol: &ProtocolFile, handler: &mut H) -> AppResult<DeckSetup>
where
    H: LiquidHandler + ?Sized,
{
    handler.home()?;

    let mut setup = DeckSetup::default();
    if let Some(deck) = &protocol.deck {
        for def in &deck.labware {
            let id = handler.load_labware(&def.kind, def.slot)?;
            setup.labware.insert(def.id.clone(), id);
        }
    }

    for def in &protocol.pipettes {
        let model: PipetteModel = def.model.parse()?;
        let mount: Mount = def.mount.parse()?;
        let racks = def
            .tip_racks
            .iter()
            .map(|rack| setup.labware(rack))
            .collect::<AppResult<Vec<_>>>()?;
        handler.load_pipette(model, mount, &racks)?;
        setup.pipettes.insert(def.id.clone(), (mount, model));
    }

    info!(
        handler = handler.name(),
        labware = setup.labware.len(),
        pipettes = setup.pipettes.len(),
        "deck ready"
    );
    Ok(setup)
}

/// Dispensing configuration from the protocol's dispense section.
pub fn dispense_config(def: &DispenseDef, deck: &DeckSetup) -> AppResult<DispenseConfig> {
    Ok(DispenseConfig {
        selection: SelectionPolicy {
            low_volume_instrument_max: ul(def.low_volume_instrument_max_ul),
        },
        pipettes: PipettePair {
            low: deck.mount(&def.low_volume_pipette)?,
            high: deck.mount(&def.high_volume_pipette)?,
        },
        tip_reuse: match def.tip_reuse {
            TipReuseDef::PerReagent => TipReuse::PerReagent,
            TipReuseDef::PerPair => TipReuse::PerPair,
        },
        top_offset: mm(def.top_offset_mm),
    })
}

/// Plan the dispense section against a loaded deck. No hardware is touched.
pub fn plan_dispense(protocol: &ProtocolFile, deck: &DeckSetup) -> AppResult<DispensePlan> {
    let def = protocol
        .dispense
        .as_ref()
        .ok_or(AppError::MissingSection("dispense"))?;

    let config = dispense_config(def, deck)?;
    let source = deck.labware(&def.source)?;
    let plates = def
        .plates
        .iter()
        .map(|id| deck.labware(id))
        .collect::<AppResult<Vec<_>>>()?;
    let pairs: Vec<ReagentPair> = def
        .reagent_pairs
        .iter()
        .map(|[a, b]| ReagentPair::new(a.clone(), b.clone()))
        .collect();
    let volumes: Vec<Vec<_>> = def
        .volumes_ul
        .iter()
        .map(|list| list.iter().copied().map(ul).collect())
        .collect();

    let plan = plan(&pairs, &volumes, def.start_index, &plates, source, &config)?;
    info!(
        wells = plan.wells_used,
        transfers = plan.transfer_count(),
        next_index = plan.next_index,
        "dispense planned"
    );
    Ok(plan)
}

/// Set up the deck, plan, then execute.
///
/// The plan is complete before the first tip is picked up, so capacity
/// errors leave the robot untouched apart from homing and loading.
pub fn run_dispense<H>(protocol: &ProtocolFile, handler: &mut H) -> AppResult<RunOutcome>
where
    H: LiquidHandler + ?Sized,
{
    let deck = setup_deck(protocol, handler)?;
    let plan = plan_dispense(protocol, &deck)?;
    let report = execute(&plan.actions, handler)?;
    Ok(RunOutcome { plan, report })
}

/// Dry run on a simulated robot; the handler is returned for inspection.
pub fn preview_dispense(protocol: &ProtocolFile) -> AppResult<(RunOutcome, SimulatedHandler)> {
    let mut handler = SimulatedHandler::new();
    let outcome = run_dispense(protocol, &mut handler)?;
    Ok((outcome, handler))
}

/// Set up the deck and run the calibration sweep.
pub fn run_calibration<H>(protocol: &ProtocolFile, handler: &mut H) -> AppResult<ExecutionReport>
where
    H: LiquidHandler + ?Sized,
{
    let def = protocol
        .calibration
        .as_ref()
        .ok_or(AppError::MissingSection("calibration"))?;

    let deck = setup_deck(protocol, handler)?;
    let destination = deck.labware(&def.destination_labware)?;
    let sweep = SpeedSweep {
        mount: deck.mount(&def.pipette)?,
        source: Well::new(deck.labware(&def.source_labware)?, def.source_well.clone()),
        destinations: def
            .destination_wells
            .iter()
            .map(|name| Well::new(destination, name.clone()))
            .collect(),
        volume: ul(def.volume_ul),
        rates: def.rates.clone(),
        prewet_cycles: def.prewet_cycles,
    };

    let actions = sweep.actions()?;
    let model = deck.model(&def.pipette)?;
    info!(
        pipette = %model,
        rates = def.rates.len(),
        volume_ul = def.volume_ul,
        "calibration sweep"
    );
    Ok(execute(&actions, handler)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oz_labware::LabwareError;
    use oz_project::schema::{DeckDef, LabwareDef, PipetteDef};

    fn labware(id: &str, kind: &str, slot: u8) -> LabwareDef {
        LabwareDef {
            id: id.to_string(),
            kind: kind.to_string(),
            slot,
        }
    }

    fn pipette(id: &str, model: &str, mount: &str, rack: &str) -> PipetteDef {
        PipetteDef {
            id: id.to_string(),
            model: model.to_string(),
            mount: mount.to_string(),
            tip_racks: vec![rack.to_string()],
        }
    }

    fn protocol(wells: usize, plates: usize) -> ProtocolFile {
        let mut deck = vec![
            labware("tips_300", "opentrons-tiprack-300ul", 10),
            labware("tips_50", "opentrons-tiprack-300ul", 11),
            labware("stock", "trough-12row", 7),
        ];
        let plate_ids: Vec<String> = (0..plates).map(|i| format!("plate_{i}")).collect();
        for (id, slot) in plate_ids.iter().zip([8, 9, 5, 6]) {
            deck.push(labware(id, "96-flat", slot));
        }
        ProtocolFile {
            version: 1,
            name: "run".to_string(),
            components: vec![],
            stocks: vec![],
            samples: vec![],
            deck: Some(DeckDef { labware: deck }),
            pipettes: vec![
                pipette("p300", "p300_single", "left", "tips_300"),
                pipette("p50", "p50_single", "right", "tips_50"),
            ],
            dispense: Some(DispenseDef {
                source: "stock".to_string(),
                plates: plate_ids,
                low_volume_pipette: "p50".to_string(),
                high_volume_pipette: "p300".to_string(),
                reagent_pairs: vec![["A1".to_string(), "A5".to_string()]],
                volumes_ul: vec![
                    (0..wells).map(|i| 10.0 + i as f64).collect(),
                    (0..wells).map(|i| 200.0 - i as f64).collect(),
                ],
                start_index: 0,
                low_volume_instrument_max_ul: 30.0,
                tip_reuse: TipReuseDef::PerReagent,
                top_offset_mm: 0.5,
            }),
            calibration: None,
        }
    }

    #[test]
    fn preview_delivers_both_reagents() {
        let (outcome, handler) = preview_dispense(&protocol(4, 1)).unwrap();
        assert_eq!(outcome.plan.wells_used, 4);
        assert_eq!(outcome.report.transfers, 8);

        let plate = LabwareId::from_index(3);
        assert!((handler.delivered_ul(&Well::new(plate, "A1")) - 210.0).abs() < 1e-9);
        assert!((handler.delivered_ul(&Well::new(plate, "D1")) - 210.0).abs() < 1e-9);
        assert_eq!(handler.delivered_ul(&Well::new(plate, "E1")), 0.0);
        assert!(!handler.has_tip(Mount::Left));
    }

    #[test]
    fn capacity_error_leaves_tips_untouched() {
        let mut handler = SimulatedHandler::new();
        let err = run_dispense(&protocol(97, 1), &mut handler).unwrap_err();
        assert!(matches!(
            err,
            AppError::Labware(LabwareError::InsufficientWells { .. })
        ));
        assert_eq!(handler.tips_used(Mount::Left), 0);
        assert_eq!(handler.tips_used(Mount::Right), 0);
    }

    #[test]
    fn plan_succeeds_where_execution_fails() {
        let mut protocol = protocol(2, 1);
        if let Some(dispense) = protocol.dispense.as_mut() {
            // 2 uL is below the P50 minimum
            dispense.volumes_ul = vec![vec![2.0, 100.0], vec![100.0, 100.0]];
        }

        let deck = setup_deck(&protocol, &mut SimulatedHandler::new()).unwrap();
        let plan = plan_dispense(&protocol, &deck).unwrap();
        assert_eq!(plan.transfer_count(), 4);
        assert!(!plan.actions.is_empty());

        let err = preview_dispense(&protocol).unwrap_err();
        match err {
            AppError::Labware(LabwareError::Aborted {
                completed, source, ..
            }) => {
                assert_eq!(completed, 2);
                assert!(matches!(*source, LabwareError::VolumeRange { .. }));
            }
            other => panic!("expected aborted run, got {other:?}"),
        }
    }

    #[test]
    fn missing_dispense_section() {
        let mut protocol = protocol(1, 1);
        protocol.dispense = None;
        let deck = setup_deck(&protocol, &mut SimulatedHandler::new()).unwrap();
        assert!(matches!(
            plan_dispense(&protocol, &deck),
            Err(AppError::MissingSection("dispense"))
        ));
    }

    #[test]
    fn config_maps_pipettes_to_mounts() {
        let protocol = protocol(1, 1);
        let deck = setup_deck(&protocol, &mut SimulatedHandler::new()).unwrap();
        let config = dispense_config(protocol.dispense.as_ref().unwrap(), &deck).unwrap();
        assert_eq!(config.pipettes.low, Mount::Right);
        assert_eq!(config.pipettes.high, Mount::Left);
        assert_eq!(deck.model("p50").unwrap(), PipetteModel::P50Single);
    }
}
