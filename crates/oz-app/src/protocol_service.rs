//! Protocol loading, validation, and introspection.

use std::path::Path;

use oz_project::schema::ProtocolFile;

use crate::error::{AppError, AppResult};

/// Counts shown by `validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolSummary {
    pub name: String,
    pub version: u32,
    pub component_count: usize,
    pub stock_count: usize,
    pub sample_count: usize,
    pub labware_count: usize,
    pub pipette_count: usize,
    /// Wells the dispense section fills, when present.
    pub dispense_wells: Option<usize>,
    /// Rates in the calibration sweep, when present.
    pub calibration_rates: Option<usize>,
}

/// Load a protocol from YAML (or JSON by extension) and validate it.
pub fn load_protocol(path: &Path) -> AppResult<ProtocolFile> {
    if !path.exists() {
        return Err(AppError::ProtocolFileRead {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        });
    }
    let protocol = oz_project::load(path)?;
    tracing::debug!(name = %protocol.name, path = %path.display(), "protocol loaded");
    Ok(protocol)
}

/// Structural validation of an in-memory protocol.
pub fn validate_protocol(protocol: &ProtocolFile) -> AppResult<()> {
    oz_project::validate_protocol(protocol)?;
    Ok(())
}

pub fn summarize(protocol: &ProtocolFile) -> ProtocolSummary {
    ProtocolSummary {
        name: protocol.name.clone(),
        version: protocol.version,
        component_count: protocol.components.len(),
        stock_count: protocol.stocks.len(),
        sample_count: protocol.samples.len(),
        labware_count: protocol.deck.as_ref().map_or(0, |d| d.labware.len()),
        pipette_count: protocol.pipettes.len(),
        dispense_wells: protocol
            .dispense
            .as_ref()
            .map(|d| d.reagent_pairs.len() * d.volumes_ul.first().map_or(0, Vec::len)),
        calibration_rates: protocol.calibration.as_ref().map(|c| c.rates.len()),
    }
}
