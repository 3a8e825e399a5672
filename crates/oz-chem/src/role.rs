//! Recipe roles and their assignment to components and stocks.

use std::fmt;

use crate::component::Component;
use crate::error::{ChemError, ChemResult};
use crate::stock::Stock;

/// Semantic slot in an ouzo sample recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Oil phase (fatty acid, mineral oil, wax)
    Hydrophobe,
    /// Water-miscible solvent carrying the hydrophobe
    OrganicSolvent,
    /// Colloidal stabilizer in the aqueous phase
    Stabilizer1,
    Water,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Hydrophobe,
        Role::OrganicSolvent,
        Role::Stabilizer1,
        Role::Water,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Role::Hydrophobe => "hydrophobe",
            Role::OrganicSolvent => "organic_solvent",
            Role::Stabilizer1 => "stabilizer1",
            Role::Water => "water",
        }
    }

    /// Position in `Role::ALL`.
    pub(crate) fn slot(self) -> usize {
        match self {
            Role::Hydrophobe => 0,
            Role::OrganicSolvent => 1,
            Role::Stabilizer1 => 2,
            Role::Water => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for Role {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.key() == s.trim())
            .ok_or_else(|| ChemError::UnknownRole {
                name: s.to_string(),
            })
    }
}

/// What fills one role: the target component, its weight fraction in the
/// final sample, and the stock it is drawn from (if not dispensed neat).
///
/// A missing weight fraction marks the role that takes the remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSpec {
    pub component: Component,
    pub weight_fraction: Option<f64>,
    pub stock: Option<Stock>,
}

impl RoleSpec {
    /// Role supplied from the pure component.
    pub fn pure(component: Component, weight_fraction: Option<f64>) -> Self {
        Self {
            component,
            weight_fraction,
            stock: None,
        }
    }

    /// Role supplied from a stock solution.
    pub fn from_stock(component: Component, weight_fraction: f64, stock: Stock) -> Self {
        Self {
            component,
            weight_fraction: Some(weight_fraction),
            stock: Some(stock),
        }
    }
}

/// The four roles of a sample, all required.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub hydrophobe: RoleSpec,
    pub organic_solvent: RoleSpec,
    pub stabilizer1: RoleSpec,
    pub water: RoleSpec,
}

impl RoleAssignment {
    /// Build from `(role name, spec)` entries, e.g. a parsed recipe map.
    ///
    /// Every recognized role must appear exactly once.
    pub fn from_entries<I, S>(entries: I) -> ChemResult<Self>
    where
        I: IntoIterator<Item = (S, RoleSpec)>,
        S: AsRef<str>,
    {
        let mut slots: [Option<RoleSpec>; 4] = [None, None, None, None];
        for (name, spec) in entries {
            let role: Role = name.as_ref().parse()?;
            let slot = &mut slots[role.slot()];
            if slot.is_some() {
                return Err(ChemError::DuplicateRole { role: role.key() });
            }
            *slot = Some(spec);
        }

        let [hydrophobe, organic_solvent, stabilizer1, water] = slots;
        let take = |spec: Option<RoleSpec>, role: Role| {
            spec.ok_or(ChemError::MissingRole { role: role.key() })
        };
        Ok(Self {
            hydrophobe: take(hydrophobe, Role::Hydrophobe)?,
            organic_solvent: take(organic_solvent, Role::OrganicSolvent)?,
            stabilizer1: take(stabilizer1, Role::Stabilizer1)?,
            water: take(water, Role::Water)?,
        })
    }

    pub fn get(&self, role: Role) -> &RoleSpec {
        match role {
            Role::Hydrophobe => &self.hydrophobe,
            Role::OrganicSolvent => &self.organic_solvent,
            Role::Stabilizer1 => &self.stabilizer1,
            Role::Water => &self.water,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &RoleSpec)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> RoleSpec {
        RoleSpec::pure(Component::new(name, None).unwrap(), Some(0.25))
    }

    #[test]
    fn parse_role_keys() {
        for role in Role::ALL {
            assert_eq!(role.key().parse::<Role>().unwrap(), role);
        }
        assert!(matches!(
            "surfactant".parse::<Role>(),
            Err(ChemError::UnknownRole { .. })
        ));
    }

    #[test]
    fn slot_follows_all_order() {
        for (i, role) in Role::ALL.into_iter().enumerate() {
            assert_eq!(role.slot(), i);
        }
    }

    #[test]
    fn entries_build_assignment() {
        let roles = RoleAssignment::from_entries([
            ("water", spec("water")),
            ("hydrophobe", spec("oleic_acid")),
            ("stabilizer1", spec("f127")),
            ("organic_solvent", spec("ethanol")),
        ])
        .unwrap();
        assert_eq!(roles.get(Role::Hydrophobe).component.name(), "oleic_acid");
        assert_eq!(roles.iter().count(), 4);
    }

    #[test]
    fn missing_role_is_reported() {
        let err = RoleAssignment::from_entries([
            ("hydrophobe", spec("oleic_acid")),
            ("organic_solvent", spec("ethanol")),
            ("water", spec("water")),
        ])
        .unwrap_err();
        assert_eq!(err, ChemError::MissingRole { role: "stabilizer1" });
    }

    #[test]
    fn duplicate_role_is_reported() {
        let err = RoleAssignment::from_entries([
            ("water", spec("water")),
            ("water", spec("water")),
        ])
        .unwrap_err();
        assert_eq!(err, ChemError::DuplicateRole { role: "water" });
    }
}
