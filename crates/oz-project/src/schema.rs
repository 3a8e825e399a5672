//! Protocol schema definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtocolFile {
    pub version: u32,
    pub name: String,
    /// Components beyond the built-in catalog, or catalog entries given a density.
    #[serde(default)]
    pub components: Vec<ComponentDef>,
    #[serde(default)]
    pub stocks: Vec<StockDef>,
    #[serde(default)]
    pub samples: Vec<SampleDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<DeckDef>,
    #[serde(default)]
    pub pipettes: Vec<PipetteDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispense: Option<DispenseDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density_g_per_ml: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockDef {
    pub id: String,
    pub solute: String,
    pub solvent: String,
    /// Weight fraction of the solute, (0, 1].
    pub solute_wtf: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density_g_per_ml: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleDef {
    pub id: String,
    pub total_mass_g: f64,
    /// Keyed by role name: hydrophobe, organic_solvent, stabilizer1, water.
    pub roles: BTreeMap<String, RoleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoleDef {
    pub component: String,
    /// Omitted for the role that takes the remainder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_fraction: Option<f64>,
    /// Stock id; omitted when the pure component is dispensed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeckDef {
    #[serde(default)]
    pub labware: Vec<LabwareDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabwareDef {
    pub id: String,
    /// Labware definition name, e.g. `96-flat`, `trough-12row`.
    pub kind: String,
    pub slot: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipetteDef {
    pub id: String,
    /// `p50_single`, `p300_single` or `p1000_single`.
    pub model: String,
    /// `left` or `right`.
    pub mount: String,
    #[serde(default)]
    pub tip_racks: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TipReuseDef {
    #[default]
    PerReagent,
    PerPair,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispenseDef {
    /// Labware id holding the reagent stocks.
    pub source: String,
    /// Destination plates, filled in order.
    pub plates: Vec<String>,
    pub low_volume_pipette: String,
    pub high_volume_pipette: String,
    /// Source wells of reagent A and reagent B.
    pub reagent_pairs: Vec<[String; 2]>,
    /// Two equally long lists: volumes of reagent A and of reagent B per well.
    pub volumes_ul: Vec<Vec<f64>>,
    #[serde(default)]
    pub start_index: usize,
    #[serde(default = "default_low_volume_instrument_max_ul")]
    pub low_volume_instrument_max_ul: f64,
    #[serde(default)]
    pub tip_reuse: TipReuseDef,
    #[serde(default = "default_top_offset_mm")]
    pub top_offset_mm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalibrationDef {
    pub pipette: String,
    pub source_labware: String,
    pub source_well: String,
    pub destination_labware: String,
    /// One destination well per rate.
    pub destination_wells: Vec<String>,
    pub volume_ul: f64,
    /// Fractions of the default flow rate.
    pub rates: Vec<f64>,
    #[serde(default = "default_prewet_cycles")]
    pub prewet_cycles: usize,
}

fn default_low_volume_instrument_max_ul() -> f64 {
    30.0
}

fn default_top_offset_mm() -> f64 {
    0.5
}

fn default_prewet_cycles() -> usize {
    2
}

impl ProtocolFile {
    pub fn labware(&self, id: &str) -> Option<&LabwareDef> {
        self.deck
            .as_ref()
            .and_then(|deck| deck.labware.iter().find(|l| l.id == id))
    }

    pub fn pipette(&self, id: &str) -> Option<&PipetteDef> {
        self.pipettes.iter().find(|p| p.id == id)
    }

    pub fn stock(&self, id: &str) -> Option<&StockDef> {
        self.stocks.iter().find(|s| s.id == id)
    }
}
