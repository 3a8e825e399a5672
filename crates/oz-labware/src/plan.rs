//! Dispensing plans for combinatorial reagent pairs.
//!
//! Each reagent pair fills a contiguous run of wells: reagent A goes in with
//! the first volume list, reagent B with the second, into the same wells.
//! The running trial index carries over from one pair to the next, across
//! plate boundaries.

use std::fmt;

use tracing::info;

use crate::error::{LabwareError, LabwareResult};
use crate::handler::TipStrategy;
use crate::location::{Location, Well, default_top_offset};
use crate::pipette::{Mount, PipettePair, SelectionPolicy};
use crate::plate::{PLATE_CAPACITY, locate, well_name};
use oz_core::LabwareId;
use oz_core::units::{Length, Volume, in_ul};

/// Source wells (e.g. trough rows) of the two reagents mixed in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReagentPair {
    pub a: String,
    pub b: String,
}

impl ReagentPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self {
            a: a.into(),
            b: b.into(),
        }
    }
}

/// When fresh tips are fitted.
///
/// The default follows the bench scripts, which fit fresh tips before each
/// reagent's run of wells. `PerPair` picks up tips once per instrument per
/// reagent pair and keeps them through both reagents of that pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TipReuse {
    /// Fresh tips on both pipettes for each reagent.
    #[default]
    PerReagent,
    /// One set of tips for the whole pair.
    PerPair,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispenseConfig {
    pub selection: SelectionPolicy,
    pub pipettes: PipettePair,
    /// `PerReagent` unless set; `PerPair` for one tip set per pair.
    pub tip_reuse: TipReuse,
    /// Height above the destination well top for dispense and blow-out.
    pub top_offset: Length,
}

impl Default for DispenseConfig {
    fn default() -> Self {
        Self {
            selection: SelectionPolicy::default(),
            pipettes: PipettePair::default(),
            tip_reuse: TipReuse::default(),
            top_offset: default_top_offset(),
        }
    }
}

/// One step for the liquid handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PickUpTip {
        mount: Mount,
    },
    DropTip {
        mount: Mount,
    },
    Aspirate {
        mount: Mount,
        volume: Volume,
        location: Location,
        rate: f64,
    },
    Dispense {
        mount: Mount,
        volume: Volume,
        location: Location,
        rate: f64,
    },
    Transfer {
        mount: Mount,
        volume: Volume,
        source: Location,
        dest: Location,
        new_tip: TipStrategy,
    },
    Distribute {
        mount: Mount,
        volume: Volume,
        source: Location,
        dests: Vec<Location>,
        rate: f64,
        new_tip: TipStrategy,
    },
    BlowOut {
        mount: Mount,
        location: Location,
    },
}

impl Action {
    pub fn mount(&self) -> Mount {
        match self {
            Action::PickUpTip { mount }
            | Action::DropTip { mount }
            | Action::Aspirate { mount, .. }
            | Action::Dispense { mount, .. }
            | Action::Transfer { mount, .. }
            | Action::Distribute { mount, .. }
            | Action::BlowOut { mount, .. } => *mount,
        }
    }

    /// Liquid this action puts into destination wells.
    pub fn delivered_ul(&self) -> f64 {
        match self {
            Action::Transfer { volume, .. } => in_ul(*volume),
            Action::Distribute { volume, dests, .. } => in_ul(*volume) * dests.len() as f64,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::PickUpTip { mount } => write!(f, "pick up tip ({mount})"),
            Action::DropTip { mount } => write!(f, "drop tip ({mount})"),
            Action::Aspirate {
                mount,
                volume,
                location,
                rate,
            } => write!(
                f,
                "aspirate {:.2} uL from {location} at {rate:.2}x ({mount})",
                in_ul(*volume)
            ),
            Action::Dispense {
                mount,
                volume,
                location,
                rate,
            } => write!(
                f,
                "dispense {:.2} uL into {location} at {rate:.2}x ({mount})",
                in_ul(*volume)
            ),
            Action::Transfer {
                mount,
                volume,
                source,
                dest,
                ..
            } => write!(
                f,
                "transfer {:.2} uL {source} -> {dest} ({mount})",
                in_ul(*volume)
            ),
            Action::Distribute {
                mount,
                volume,
                source,
                dests,
                rate,
                ..
            } => write!(
                f,
                "distribute {:.2} uL from {source} into {} well(s) at {rate:.2}x ({mount})",
                in_ul(*volume),
                dests.len()
            ),
            Action::BlowOut { mount, location } => write!(f, "blow out at {location} ({mount})"),
        }
    }
}

/// Ordered actions plus the trial-index bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct DispensePlan {
    pub actions: Vec<Action>,
    pub start_index: usize,
    /// First free trial index after this plan.
    pub next_index: usize,
    pub wells_used: usize,
}

impl DispensePlan {
    pub fn transfer_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::Transfer { .. }))
            .count()
    }

    pub fn total_volume_ul(&self) -> f64 {
        self.actions.iter().map(Action::delivered_ul).sum()
    }
}

/// Plan the dispensing of every reagent pair at every volume step.
///
/// `volume_lists` holds exactly two equally long lists: volumes of reagent A
/// and of reagent B, one entry per well. The capacity check runs before any
/// action is produced.
pub fn plan(
    reagent_pairs: &[ReagentPair],
    volume_lists: &[Vec<Volume>],
    start_index: usize,
    plates: &[LabwareId],
    source: LabwareId,
    config: &DispenseConfig,
) -> LabwareResult<DispensePlan> {
    let [volumes_a, volumes_b] = volume_lists else {
        return Err(LabwareError::InvalidVolumeLists {
            what: format!("expected 2 volume lists, got {}", volume_lists.len()),
        });
    };
    if volumes_a.len() != volumes_b.len() {
        return Err(LabwareError::InvalidVolumeLists {
            what: format!(
                "volume lists differ in length ({} vs {})",
                volumes_a.len(),
                volumes_b.len()
            ),
        });
    }
    if let Some(bad) = volumes_a
        .iter()
        .chain(volumes_b)
        .map(|v| in_ul(*v))
        .find(|v| !v.is_finite() || *v < 0.0)
    {
        return Err(LabwareError::InvalidVolumeLists {
            what: format!("volume {bad} uL is not a finite, non-negative value"),
        });
    }
    if config.pipettes.low == config.pipettes.high {
        return Err(LabwareError::InvalidArg {
            what: format!(
                "low- and high-volume pipettes share the {} mount",
                config.pipettes.low
            ),
        });
    }

    let wells_per_pair = volumes_a.len();
    let needed = reagent_pairs.len() * wells_per_pair;
    let available = (PLATE_CAPACITY * plates.len()).saturating_sub(start_index);
    if needed > available {
        return Err(LabwareError::InsufficientWells { needed, available });
    }

    let mut builder = PlanBuilder {
        actions: Vec::new(),
        plates,
        source,
        config,
    };
    let mut index = start_index;
    for pair in reagent_pairs {
        info!(a = %pair.a, b = %pair.b, first_well = index, "planning pair");
        match config.tip_reuse {
            TipReuse::PerReagent => {
                builder.fit_tips();
                builder.fill(&pair.a, volumes_a, index)?;
                builder.release_tips();
                builder.fit_tips();
                builder.fill(&pair.b, volumes_b, index)?;
                builder.release_tips();
            }
            TipReuse::PerPair => {
                builder.fit_tips();
                builder.fill(&pair.a, volumes_a, index)?;
                builder.fill(&pair.b, volumes_b, index)?;
                builder.release_tips();
            }
        }
        index += wells_per_pair;
    }

    Ok(DispensePlan {
        actions: builder.actions,
        start_index,
        next_index: index,
        wells_used: needed,
    })
}

struct PlanBuilder<'a> {
    actions: Vec<Action>,
    plates: &'a [LabwareId],
    source: LabwareId,
    config: &'a DispenseConfig,
}

impl PlanBuilder<'_> {
    /// Both pipettes are held for the whole run, high-volume first.
    fn fit_tips(&mut self) {
        let pipettes = self.config.pipettes;
        self.actions.push(Action::PickUpTip {
            mount: pipettes.high,
        });
        self.actions.push(Action::PickUpTip {
            mount: pipettes.low,
        });
    }

    fn release_tips(&mut self) {
        let pipettes = self.config.pipettes;
        self.actions.push(Action::DropTip {
            mount: pipettes.high,
        });
        self.actions.push(Action::DropTip {
            mount: pipettes.low,
        });
    }

    fn fill(&mut self, reagent: &str, volumes: &[Volume], first: usize) -> LabwareResult<()> {
        let source = Location::at(Well::new(self.source, reagent));
        for (k, volume) in volumes.iter().enumerate() {
            let Some(class) = self.config.selection.select(*volume) else {
                continue;
            };
            let mount = self.config.pipettes.mount(class);
            let (plate, offset) = locate(first + k, self.plates)?;
            let dest = Location::top(Well::new(*plate, well_name(offset)), self.config.top_offset);

            self.actions.push(Action::Transfer {
                mount,
                volume: *volume,
                source: source.clone(),
                dest: dest.clone(),
                new_tip: TipStrategy::Never,
            });
            self.actions.push(Action::BlowOut {
                mount,
                location: dest,
            });
        }
        Ok(())
    }
}
