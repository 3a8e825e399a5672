//! Protocol validation logic.

use crate::LATEST_VERSION;
use crate::schema::{CalibrationDef, DispenseDef, ProtocolFile};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

const DECK_SLOTS: std::ops::RangeInclusive<u8> = 1..=11;

/// Pipette model keys, with their short forms.
pub const PIPETTE_MODELS: [&str; 6] = [
    "p50_single",
    "p300_single",
    "p1000_single",
    "p50",
    "p300",
    "p1000",
];

/// Role keys a sample may use.
pub const ROLE_NAMES: [&str; 4] = ["hydrophobe", "organic_solvent", "stabilizer1", "water"];

pub fn validate_protocol(protocol: &ProtocolFile) -> Result<(), ValidationError> {
    if protocol.version == 0 || protocol.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: protocol.version,
        });
    }

    let mut component_names = HashSet::new();
    for component in &protocol.components {
        if !component_names.insert(&component.name) {
            return Err(ValidationError::DuplicateId {
                id: component.name.clone(),
                context: "components".to_string(),
            });
        }
        if let Some(mw) = component.molecular_weight {
            positive(mw, format!("components.{}.molecular_weight", component.name))?;
        }
        if let Some(rho) = component.density_g_per_ml {
            positive(rho, format!("components.{}.density_g_per_ml", component.name))?;
        }
    }

    let mut stock_ids = HashSet::new();
    for stock in &protocol.stocks {
        if !stock_ids.insert(&stock.id) {
            return Err(ValidationError::DuplicateId {
                id: stock.id.clone(),
                context: "stocks".to_string(),
            });
        }
        if !(stock.solute_wtf.is_finite() && stock.solute_wtf > 0.0 && stock.solute_wtf <= 1.0) {
            return Err(invalid(
                format!("stocks.{}.solute_wtf", stock.id),
                stock.solute_wtf,
                "must lie in (0, 1]",
            ));
        }
        if let Some(rho) = stock.density_g_per_ml {
            positive(rho, format!("stocks.{}.density_g_per_ml", stock.id))?;
        }
    }

    let mut sample_ids = HashSet::new();
    for sample in &protocol.samples {
        if !sample_ids.insert(&sample.id) {
            return Err(ValidationError::DuplicateId {
                id: sample.id.clone(),
                context: "samples".to_string(),
            });
        }
        positive(sample.total_mass_g, format!("samples.{}.total_mass_g", sample.id))?;
        for (role, def) in &sample.roles {
            if !ROLE_NAMES.contains(&role.as_str()) {
                return Err(invalid(
                    format!("samples.{}.roles", sample.id),
                    role,
                    "expected hydrophobe, organic_solvent, stabilizer1 or water",
                ));
            }
            if let Some(wtf) = def.weight_fraction {
                if !(wtf.is_finite() && (0.0..=1.0).contains(&wtf)) {
                    return Err(invalid(
                        format!("samples.{}.roles.{role}.weight_fraction", sample.id),
                        wtf,
                        "must lie in [0, 1]",
                    ));
                }
            }
            if let Some(stock) = &def.stock {
                if !stock_ids.contains(stock) {
                    return Err(ValidationError::MissingReference {
                        id: stock.clone(),
                        context: format!("samples.{}.roles.{role}.stock", sample.id),
                    });
                }
            }
        }
    }

    let mut labware_ids = HashSet::new();
    let mut slots = HashSet::new();
    if let Some(deck) = &protocol.deck {
        for labware in &deck.labware {
            if !labware_ids.insert(labware.id.as_str()) {
                return Err(ValidationError::DuplicateId {
                    id: labware.id.clone(),
                    context: "deck.labware".to_string(),
                });
            }
            if !DECK_SLOTS.contains(&labware.slot) {
                return Err(invalid(
                    format!("deck.labware.{}.slot", labware.id),
                    labware.slot,
                    "deck slots are 1-11",
                ));
            }
            if !slots.insert(labware.slot) {
                return Err(ValidationError::DuplicateId {
                    id: labware.slot.to_string(),
                    context: "deck slots".to_string(),
                });
            }
        }
    }

    let mut pipette_ids = HashSet::new();
    let mut mounts = HashSet::new();
    for pipette in &protocol.pipettes {
        if !pipette_ids.insert(pipette.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: pipette.id.clone(),
                context: "pipettes".to_string(),
            });
        }
        let model = pipette.model.trim().to_ascii_lowercase();
        if !PIPETTE_MODELS.contains(&model.as_str()) {
            return Err(invalid(
                format!("pipettes.{}.model", pipette.id),
                &pipette.model,
                "expected p50_single, p300_single or p1000_single",
            ));
        }
        let mount = pipette.mount.to_ascii_lowercase();
        if mount != "left" && mount != "right" {
            return Err(invalid(
                format!("pipettes.{}.mount", pipette.id),
                &pipette.mount,
                "expected left or right",
            ));
        }
        if !mounts.insert(mount) {
            return Err(ValidationError::DuplicateId {
                id: pipette.mount.clone(),
                context: "pipette mounts".to_string(),
            });
        }
        for rack in &pipette.tip_racks {
            require(&labware_ids, rack, || format!("pipettes.{}.tip_racks", pipette.id))?;
        }
    }

    if let Some(dispense) = &protocol.dispense {
        validate_dispense(dispense, &labware_ids, &pipette_ids)?;
    }
    if let Some(calibration) = &protocol.calibration {
        validate_calibration(calibration, &labware_ids, &pipette_ids)?;
    }

    Ok(())
}

fn validate_dispense(
    dispense: &DispenseDef,
    labware_ids: &HashSet<&str>,
    pipette_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    require(labware_ids, &dispense.source, || "dispense.source".to_string())?;
    for plate in &dispense.plates {
        require(labware_ids, plate, || "dispense.plates".to_string())?;
    }
    require(pipette_ids, &dispense.low_volume_pipette, || {
        "dispense.low_volume_pipette".to_string()
    })?;
    require(pipette_ids, &dispense.high_volume_pipette, || {
        "dispense.high_volume_pipette".to_string()
    })?;
    if dispense.low_volume_pipette == dispense.high_volume_pipette {
        return Err(invalid(
            "dispense.high_volume_pipette",
            &dispense.high_volume_pipette,
            "must differ from the low-volume pipette",
        ));
    }

    if dispense.volumes_ul.len() != 2 {
        return Err(invalid(
            "dispense.volumes_ul",
            format!("{} lists", dispense.volumes_ul.len()),
            "expected one list per reagent of the pair",
        ));
    }
    if dispense.volumes_ul[0].len() != dispense.volumes_ul[1].len() {
        return Err(invalid(
            "dispense.volumes_ul",
            format!(
                "{} vs {} entries",
                dispense.volumes_ul[0].len(),
                dispense.volumes_ul[1].len()
            ),
            "lists must be equally long",
        ));
    }
    if let Some(bad) = dispense
        .volumes_ul
        .iter()
        .flatten()
        .find(|v| !v.is_finite() || **v < 0.0)
    {
        return Err(invalid("dispense.volumes_ul", bad, "volumes must be non-negative"));
    }
    positive(
        dispense.low_volume_instrument_max_ul,
        "dispense.low_volume_instrument_max_ul".to_string(),
    )?;
    if !dispense.top_offset_mm.is_finite() {
        return Err(invalid(
            "dispense.top_offset_mm",
            dispense.top_offset_mm,
            "must be finite",
        ));
    }
    Ok(())
}

fn validate_calibration(
    calibration: &CalibrationDef,
    labware_ids: &HashSet<&str>,
    pipette_ids: &HashSet<&str>,
) -> Result<(), ValidationError> {
    require(pipette_ids, &calibration.pipette, || "calibration.pipette".to_string())?;
    require(labware_ids, &calibration.source_labware, || {
        "calibration.source_labware".to_string()
    })?;
    require(labware_ids, &calibration.destination_labware, || {
        "calibration.destination_labware".to_string()
    })?;
    positive(calibration.volume_ul, "calibration.volume_ul".to_string())?;
    if calibration.rates.is_empty() {
        return Err(invalid("calibration.rates", "[]", "at least one rate required"));
    }
    for rate in &calibration.rates {
        positive(*rate, "calibration.rates".to_string())?;
    }
    if calibration.destination_wells.len() < calibration.rates.len() {
        return Err(invalid(
            "calibration.destination_wells",
            calibration.destination_wells.len(),
            "need one destination well per rate",
        ));
    }
    Ok(())
}

fn require(
    ids: &HashSet<&str>,
    id: &str,
    context: impl FnOnce() -> String,
) -> Result<(), ValidationError> {
    if ids.contains(id) {
        Ok(())
    } else {
        Err(ValidationError::MissingReference {
            id: id.to_string(),
            context: context(),
        })
    }
}

fn positive(value: f64, field: String) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive"))
    }
}

fn invalid(
    field: impl Into<String>,
    value: impl ToString,
    reason: &str,
) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn minimal() -> ProtocolFile {
        ProtocolFile {
            version: 1,
            name: "minimal".to_string(),
            components: vec![],
            stocks: vec![],
            samples: vec![],
            deck: None,
            pipettes: vec![],
            dispense: None,
            calibration: None,
        }
    }

    #[test]
    fn minimal_is_valid() {
        validate_protocol(&minimal()).unwrap();
    }

    #[test]
    fn future_version_rejected() {
        let mut protocol = minimal();
        protocol.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_protocol(&protocol),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn sample_stock_must_exist() {
        let mut protocol = minimal();
        protocol.samples.push(SampleDef {
            id: "s1".to_string(),
            total_mass_g: 10.0,
            roles: [(
                "hydrophobe".to_string(),
                RoleDef {
                    component: "oleic_acid".to_string(),
                    weight_fraction: Some(0.1),
                    stock: Some("missing".to_string()),
                },
            )]
            .into_iter()
            .collect(),
        });
        assert!(matches!(
            validate_protocol(&protocol),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn stock_fraction_bounds() {
        let mut protocol = minimal();
        protocol.stocks.push(StockDef {
            id: "oa".to_string(),
            solute: "oleic_acid".to_string(),
            solvent: "ethanol".to_string(),
            solute_wtf: 0.0,
            density_g_per_ml: None,
        });
        assert!(matches!(
            validate_protocol(&protocol),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_role_rejected() {
        let mut protocol = minimal();
        protocol.samples.push(SampleDef {
            id: "s1".to_string(),
            total_mass_g: 10.0,
            roles: [(
                "stabilizer2".to_string(),
                RoleDef {
                    component: "water".to_string(),
                    weight_fraction: None,
                    stock: None,
                },
            )]
            .into_iter()
            .collect(),
        });
        assert!(matches!(
            validate_protocol(&protocol),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn unknown_pipette_model_rejected() {
        let mut protocol = minimal();
        protocol.pipettes.push(PipetteDef {
            id: "p20".to_string(),
            model: "p20".to_string(),
            mount: "left".to_string(),
            tip_racks: vec![],
        });
        match validate_protocol(&protocol) {
            Err(ValidationError::InvalidValue { field, .. }) => {
                assert_eq!(field, "pipettes.p20.model")
            }
            other => panic!("expected invalid model, got {other:?}"),
        }

        protocol.pipettes[0].model = "P300_Single".to_string();
        validate_protocol(&protocol).unwrap();
    }

    #[test]
    fn slots_must_be_unique() {
        let mut protocol = minimal();
        protocol.deck = Some(DeckDef {
            labware: vec![
                LabwareDef {
                    id: "a".to_string(),
                    kind: "96-flat".to_string(),
                    slot: 8,
                },
                LabwareDef {
                    id: "b".to_string(),
                    kind: "96-flat".to_string(),
                    slot: 8,
                },
            ],
        });
        assert!(matches!(
            validate_protocol(&protocol),
            Err(ValidationError::DuplicateId { .. })
        ));
    }
}
