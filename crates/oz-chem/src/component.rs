//! Chemical components and the registry that names them.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::catalog::builtin_catalog;
use crate::error::{ChemError, ChemResult};
use oz_core::numeric::ensure_positive;

/// A chemical component identified by name.
///
/// Some components (waxes, mineral oil cuts) have no defined molecular
/// weight, so it is optional. Identity is the name alone.
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    molecular_weight: Option<f64>,
}

impl Component {
    /// Create a component. The name must be non-empty and a given
    /// molecular weight [g/mol] must be positive.
    pub fn new(name: impl Into<String>, molecular_weight: Option<f64>) -> ChemResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ChemError::NonPhysical("empty component name".into()));
        }
        if let Some(mw) = molecular_weight {
            ensure_positive(mw, "molecular weight")?;
        }
        Ok(Self {
            name,
            molecular_weight,
        })
    }

    pub(crate) fn from_catalog(name: &str, molecular_weight: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            molecular_weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Molecular weight in g/mol, if defined.
    pub fn molecular_weight(&self) -> Option<f64> {
        self.molecular_weight
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Component {}

impl Hash for Component {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Static set of components available to one run.
///
/// Built once at startup and read-only afterwards; names are unique.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    by_name: BTreeMap<String, Component>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with every built-in catalog component.
    pub fn with_builtins() -> Self {
        let by_name = builtin_catalog()
            .iter()
            .map(|entry| (entry.id.to_string(), entry.component()))
            .collect();
        Self { by_name }
    }

    /// Add a component. Names must be unique.
    pub fn register(&mut self, component: Component) -> ChemResult<()> {
        if self.by_name.contains_key(component.name()) {
            return Err(ChemError::DuplicateComponent {
                name: component.name().to_string(),
            });
        }
        self.by_name.insert(component.name().to_string(), component);
        Ok(())
    }

    /// Look up a component by name, falling back to catalog aliases.
    pub fn get(&self, name: &str) -> ChemResult<&Component> {
        if let Some(component) = self.by_name.get(name) {
            return Ok(component);
        }
        builtin_catalog()
            .iter()
            .find(|entry| entry.is_named(name))
            .and_then(|entry| self.by_name.get(entry.id))
            .ok_or_else(|| ChemError::UnknownComponent {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.by_name.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_name() {
        let a = Component::new("ethanol", Some(46.07)).unwrap();
        let b = Component::new("ethanol", None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_molecular_weight() {
        assert!(Component::new("x", Some(0.0)).is_err());
        assert!(Component::new("x", Some(f64::NAN)).is_err());
        assert!(Component::new("  ", None).is_err());
    }

    #[test]
    fn wax_has_no_molecular_weight() {
        let registry = ComponentRegistry::with_builtins();
        let wax = registry.get("candelilla_wax").unwrap();
        assert_eq!(wax.molecular_weight(), None);
    }

    #[test]
    fn lookup_by_alias() {
        let registry = ComponentRegistry::with_builtins();
        let etoh = registry.get("EtOH").unwrap();
        assert_eq!(etoh.name(), "ethanol");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ComponentRegistry::with_builtins();
        let err = registry
            .register(Component::new("ethanol", Some(46.07)).unwrap())
            .unwrap_err();
        assert!(matches!(err, ChemError::DuplicateComponent { .. }));
    }

    #[test]
    fn unknown_component() {
        let registry = ComponentRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.get("ethanol"),
            Err(ChemError::UnknownComponent { .. })
        ));
    }
}
