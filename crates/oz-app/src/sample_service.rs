//! Sample composition: from protocol definitions to per-role masses and volumes.

use std::collections::BTreeMap;

use oz_chem::{
    ChemError, Component, ComponentRegistry, DispenseLine, DispenseSource, OuzoSample,
    RoleAssignment, RoleSpec, Stock,
};
use oz_core::units::{Density, Volume, g, g_per_ml};
use oz_project::schema::{ProtocolFile, SampleDef};
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};

/// A computed sample, with dispense volumes when every source has a density.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleReport {
    pub id: String,
    pub sample: OuzoSample,
    pub volumes: Option<Vec<(DispenseLine, Volume)>>,
}

/// Result for one sample of a batch. A failed sample does not stop the others.
#[derive(Debug)]
pub enum SampleOutcome {
    Computed(SampleReport),
    Failed { id: String, error: AppError },
}

impl SampleOutcome {
    pub fn id(&self) -> &str {
        match self {
            SampleOutcome::Computed(report) => &report.id,
            SampleOutcome::Failed { id, .. } => id,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, SampleOutcome::Computed(_))
    }
}

/// Built-in catalog plus the protocol's own components.
///
/// A component entry naming a catalog compound only contributes its density.
pub fn build_registry(protocol: &ProtocolFile) -> AppResult<ComponentRegistry> {
    let mut registry = ComponentRegistry::with_builtins();
    for def in &protocol.components {
        if registry.get(&def.name).is_ok() {
            continue;
        }
        registry.register(Component::new(def.name.clone(), def.molecular_weight)?)?;
    }
    Ok(registry)
}

/// Stocks keyed by id.
pub fn build_stocks(
    protocol: &ProtocolFile,
    registry: &ComponentRegistry,
) -> AppResult<BTreeMap<String, Stock>> {
    protocol
        .stocks
        .iter()
        .map(|def| -> AppResult<(String, Stock)> {
            let stock = Stock::new(
                def.id.clone(),
                registry.get(&def.solute)?.clone(),
                registry.get(&def.solvent)?.clone(),
                def.solute_wtf,
            )?;
            Ok((def.id.clone(), stock))
        })
        .collect()
}

/// Compute one sample definition.
pub fn compute_sample(
    def: &SampleDef,
    registry: &ComponentRegistry,
    stocks: &BTreeMap<String, Stock>,
) -> AppResult<OuzoSample> {
    let wrap = |source: ChemError| AppError::Sample {
        sample: def.id.clone(),
        source,
    };

    let mut entries = Vec::with_capacity(def.roles.len());
    for (role, role_def) in &def.roles {
        let component = registry.get(&role_def.component).map_err(wrap)?.clone();
        let stock = match &role_def.stock {
            Some(id) => Some(stocks.get(id).cloned().ok_or_else(|| {
                AppError::InvalidInput(format!("sample '{}': unknown stock '{id}'", def.id))
            })?),
            None => None,
        };
        entries.push((
            role.as_str(),
            RoleSpec {
                component,
                weight_fraction: role_def.weight_fraction,
                stock,
            },
        ));
    }

    let roles = RoleAssignment::from_entries(entries).map_err(wrap)?;
    OuzoSample::compute(g(def.total_mass_g), &roles).map_err(wrap)
}

/// Compute every sample of the protocol.
///
/// Registry or stock problems fail the whole batch; a sample that cannot be
/// made is reported in its outcome and the batch continues.
pub fn compute_samples(protocol: &ProtocolFile) -> AppResult<Vec<SampleOutcome>> {
    let registry = build_registry(protocol)?;
    let stocks = build_stocks(protocol, &registry)?;
    let densities = Densities::from_protocol(protocol, &registry);

    let outcomes = protocol
        .samples
        .iter()
        .map(|def| match compute_sample(def, &registry, &stocks) {
            Ok(sample) => {
                let volumes = sample.dispense_volumes(|source| densities.of(source)).ok();
                debug!(
                    sample = %def.id,
                    lines = sample.dispense_lines().len(),
                    volumes = volumes.is_some(),
                    "sample computed"
                );
                SampleOutcome::Computed(SampleReport {
                    id: def.id.clone(),
                    sample,
                    volumes,
                })
            }
            Err(error) => {
                warn!(sample = %def.id, %error, "sample rejected");
                SampleOutcome::Failed {
                    id: def.id.clone(),
                    error,
                }
            }
        })
        .collect();
    Ok(outcomes)
}

/// Densities declared in the protocol, keyed by canonical component name and stock id.
struct Densities {
    components: BTreeMap<String, Density>,
    stocks: BTreeMap<String, Density>,
}

impl Densities {
    fn from_protocol(protocol: &ProtocolFile, registry: &ComponentRegistry) -> Self {
        let components = protocol
            .components
            .iter()
            .filter_map(|def| {
                let rho = def.density_g_per_ml?;
                let name = registry
                    .get(&def.name)
                    .map(|c| c.name().to_string())
                    .unwrap_or_else(|_| def.name.clone());
                Some((name, g_per_ml(rho)))
            })
            .collect();
        let stocks = protocol
            .stocks
            .iter()
            .filter_map(|def| Some((def.id.clone(), g_per_ml(def.density_g_per_ml?))))
            .collect();
        Self { components, stocks }
    }

    fn of(&self, source: &DispenseSource) -> Option<Density> {
        match source {
            DispenseSource::Stock(id) => self.stocks.get(id).copied(),
            DispenseSource::Pure(name) => self.components.get(name).copied(),
        }
    }
}
