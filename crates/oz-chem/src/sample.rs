//! Ouzo sample composition.
//!
//! A sample is defined by its total mass and the weight fraction of each
//! role. When a role is drawn from a stock, the stock's solvent is itself
//! one of the other roles (oil dissolved in the organic solvent, stabilizer
//! dissolved in water). The solvent carried in by the stock is credited
//! against that role, so only the remainder is dispensed neat.

use std::fmt;

use tracing::debug;

use crate::component::Component;
use crate::error::{ChemError, ChemResult};
use crate::role::{Role, RoleAssignment};
use crate::stock::{Stock, solvent_carried};
use oz_core::numeric::{Tolerances, ensure_fraction, ensure_positive, nearly_equal};
use oz_core::units::{Density, Mass, Volume, g, in_g, volume_of};

/// Tolerance on the sum of weight fractions and on the solvent budget.
const FRACTION_TOL: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 1e-9,
};

/// Stock dispensed to supply a role's solute.
#[derive(Debug, Clone, PartialEq)]
pub struct StockDraw {
    pub stock: Stock,
    /// Total stock mass to dispense.
    pub stock_mass: Mass,
    /// Solvent mass carried in with the solute.
    pub solvent_mass: Mass,
    /// Role whose solvent budget absorbs `solvent_mass`.
    pub solvent_role: Role,
}

/// Per-role masses of a computed sample.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleMasses {
    pub role: Role,
    pub component: Component,
    /// Effective weight fraction (the remainder role gets the computed value).
    pub weight_fraction: f64,
    /// Nominal mass of the component in the sample.
    pub target_mass: Mass,
    pub stock_draw: Option<StockDraw>,
    /// Solvent already delivered to this role by other roles' stocks.
    pub solvent_credit: Mass,
}

impl RoleMasses {
    /// Mass still to be dispensed neat once stock solvent is credited.
    pub fn additional_solvent_mass(&self) -> Mass {
        self.target_mass - self.solvent_credit
    }

    /// Mass dispensed from the pure component, `None` when drawn from a stock.
    pub fn pure_mass(&self) -> Option<Mass> {
        match self.stock_draw {
            Some(_) => None,
            None => Some(self.additional_solvent_mass()),
        }
    }

    /// Mass physically dispensed for this role (stock or neat).
    pub fn dispensed_mass(&self) -> Mass {
        match &self.stock_draw {
            Some(draw) => draw.stock_mass,
            None => self.additional_solvent_mass(),
        }
    }
}

/// Physical source of one dispense.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DispenseSource {
    Stock(String),
    Pure(String),
}

impl DispenseSource {
    pub fn name(&self) -> &str {
        match self {
            DispenseSource::Stock(name) | DispenseSource::Pure(name) => name,
        }
    }
}

impl fmt::Display for DispenseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispenseSource::Stock(name) => write!(f, "stock {name}"),
            DispenseSource::Pure(name) => write!(f, "pure {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispenseLine {
    pub role: Role,
    pub source: DispenseSource,
    pub mass: Mass,
}

/// Computed composition of one ouzo sample. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OuzoSample {
    total_mass: Mass,
    roles: Vec<RoleMasses>,
}

impl OuzoSample {
    /// Compute per-role masses for a sample of `total_mass`.
    ///
    /// At most one role may omit its weight fraction; it receives the
    /// remainder. Otherwise the fractions must sum to one.
    pub fn compute(total_mass: Mass, roles: &RoleAssignment) -> ChemResult<Self> {
        let total_g = ensure_positive(in_g(total_mass), "total sample mass")?;
        let fractions = resolve_fractions(roles)?;

        let mut masses: Vec<RoleMasses> = roles
            .iter()
            .zip(fractions)
            .map(|((role, spec), wtf)| RoleMasses {
                role,
                component: spec.component.clone(),
                weight_fraction: wtf,
                target_mass: g(total_g * wtf),
                stock_draw: None,
                solvent_credit: g(0.0),
            })
            .collect();

        for (role, spec) in roles.iter() {
            let Some(stock) = &spec.stock else {
                continue;
            };
            stock.validate()?;
            if stock.solute() != &spec.component {
                return Err(stock.invalid(format!(
                    "solute {} does not supply {} ({})",
                    stock.solute(),
                    role,
                    spec.component
                )));
            }

            let solvent_role = solvent_role_for(roles, role, stock)?;
            let target = masses[role.slot()].target_mass;
            let stock_mass = stock.stock_mass_for(target)?;
            let solvent_mass = g(solvent_carried(stock_mass, target));

            debug!(
                role = role.key(),
                stock = stock.name(),
                stock_g = in_g(stock_mass),
                solvent_g = in_g(solvent_mass),
                solvent_role = solvent_role.key(),
                "stock drawn"
            );

            masses[solvent_role.slot()].solvent_credit += solvent_mass;
            masses[role.slot()].stock_draw = Some(StockDraw {
                stock: stock.clone(),
                stock_mass,
                solvent_mass,
                solvent_role,
            });
        }

        for entry in &mut masses {
            let budget = in_g(entry.target_mass);
            let credit = in_g(entry.solvent_credit);
            let remaining = budget - credit;
            if remaining < 0.0 {
                if nearly_equal(budget, credit, FRACTION_TOL) {
                    // rounding noise only
                    entry.solvent_credit = entry.target_mass;
                } else {
                    return Err(ChemError::InfeasibleComposition {
                        role: entry.role.key(),
                        budget_g: budget,
                        contributed_g: credit,
                    });
                }
            }
        }

        Ok(Self {
            total_mass,
            roles: masses,
        })
    }

    pub fn total_mass(&self) -> Mass {
        self.total_mass
    }

    pub fn role(&self, role: Role) -> &RoleMasses {
        &self.roles[role.slot()]
    }

    pub fn roles(&self) -> &[RoleMasses] {
        &self.roles
    }

    /// Sum of every mass physically dispensed; equals the total mass.
    pub fn dispensed_total(&self) -> Mass {
        self.roles
            .iter()
            .fold(g(0.0), |acc, entry| acc + entry.dispensed_mass())
    }

    /// One line per physical source with a non-negligible mass, in role order.
    pub fn dispense_lines(&self) -> Vec<DispenseLine> {
        self.roles
            .iter()
            .filter_map(|entry| {
                let (source, mass) = match &entry.stock_draw {
                    Some(draw) => (
                        DispenseSource::Stock(draw.stock.name().to_string()),
                        draw.stock_mass,
                    ),
                    None => (
                        DispenseSource::Pure(entry.component.name().to_string()),
                        entry.additional_solvent_mass(),
                    ),
                };
                (in_g(mass) > FRACTION_TOL.abs).then_some(DispenseLine {
                    role: entry.role,
                    source,
                    mass,
                })
            })
            .collect()
    }

    /// Convert dispense lines to volumes with caller-supplied densities.
    pub fn dispense_volumes<F>(&self, density_of: F) -> ChemResult<Vec<(DispenseLine, Volume)>>
    where
        F: Fn(&DispenseSource) -> Option<Density>,
    {
        self.dispense_lines()
            .into_iter()
            .map(|line| -> ChemResult<(DispenseLine, Volume)> {
                let density = density_of(&line.source).ok_or_else(|| ChemError::MissingDensity {
                    source_name: line.source.to_string(),
                })?;
                let volume = volume_of(line.mass, density);
                Ok((line, volume))
            })
            .collect()
    }
}

/// Effective weight fraction of each role, in `Role::ALL` order.
fn resolve_fractions(roles: &RoleAssignment) -> ChemResult<[f64; 4]> {
    let mut fractions = [0.0; 4];
    let mut remainder_role = None;
    let mut explicit_sum = 0.0;

    for (i, (role, spec)) in roles.iter().enumerate() {
        match spec.weight_fraction {
            Some(wtf) => {
                fractions[i] = ensure_fraction(wtf, "role weight fraction")?;
                explicit_sum += wtf;
            }
            None => {
                if let Some(previous) = remainder_role {
                    return Err(ChemError::InvalidWeightFractions {
                        reason: format!(
                            "both {previous} and {role} omit their weight fraction"
                        ),
                    });
                }
                remainder_role = Some(role);
            }
        }
    }

    match remainder_role {
        Some(role) => {
            let remainder = 1.0 - explicit_sum;
            if remainder < 0.0 && !nearly_equal(explicit_sum, 1.0, FRACTION_TOL) {
                return Err(ChemError::InvalidWeightFractions {
                    reason: format!(
                        "explicit fractions sum to {explicit_sum}, leaving nothing for {role}"
                    ),
                });
            }
            fractions[role.slot()] = remainder.max(0.0);
        }
        None => {
            if !nearly_equal(explicit_sum, 1.0, FRACTION_TOL) {
                return Err(ChemError::InvalidWeightFractions {
                    reason: format!("fractions sum to {explicit_sum}, expected 1"),
                });
            }
        }
    }

    Ok(fractions)
}

/// Role whose component is the stock's solvent.
fn solvent_role_for(roles: &RoleAssignment, role: Role, stock: &Stock) -> ChemResult<Role> {
    let mut candidates = roles
        .iter()
        .filter(|(other, spec)| *other != role && &spec.component == stock.solvent());

    let Some((solvent_role, solvent_spec)) = candidates.next() else {
        return Err(ChemError::UnaccountedSolvent {
            stock: stock.name().to_string(),
            solvent: stock.solvent().name().to_string(),
        });
    };
    if candidates.next().is_some() {
        return Err(ChemError::AmbiguousSolvent {
            stock: stock.name().to_string(),
            solvent: stock.solvent().name().to_string(),
        });
    }
    if solvent_spec.stock.is_some() {
        return Err(stock.invalid(format!(
            "solvent role {solvent_role} is itself drawn from a stock"
        )));
    }
    Ok(solvent_role)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ComponentRegistry, RoleSpec};

    fn registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::with_builtins();
        registry
            .register(Component::new("pluronic_f127", Some(12_600.0)).unwrap())
            .unwrap();
        registry
    }

    fn comp(name: &str) -> Component {
        registry().get(name).unwrap().clone()
    }

    fn close(a: Mass, b: f64) -> bool {
        nearly_equal(
            in_g(a),
            b,
            Tolerances {
                abs: 1e-9,
                rel: 1e-9,
            },
        )
    }

    /// Oleic acid 10 wt% from a 50 wt% ethanol stock, ethanol 30 wt%,
    /// F127 5 wt% from a 10 wt% aqueous stock, water takes the rest.
    fn reference_roles() -> RoleAssignment {
        let oleic_stock = Stock::new("oa_etoh", comp("oleic_acid"), comp("ethanol"), 0.5).unwrap();
        let f127_stock = Stock::new("f127_aq", comp("pluronic_f127"), comp("water"), 0.1).unwrap();
        RoleAssignment {
            hydrophobe: RoleSpec::from_stock(comp("oleic_acid"), 0.1, oleic_stock),
            organic_solvent: RoleSpec::pure(comp("ethanol"), Some(0.3)),
            stabilizer1: RoleSpec::from_stock(comp("pluronic_f127"), 0.05, f127_stock),
            water: RoleSpec::pure(comp("water"), None),
        }
    }

    #[test]
    fn hydrophobe_stock_in_organic_solvent() {
        let sample = OuzoSample::compute(g(10.0), &reference_roles()).unwrap();

        let hydrophobe = sample.role(Role::Hydrophobe);
        assert!(close(hydrophobe.target_mass, 1.0));
        let draw = hydrophobe.stock_draw.as_ref().unwrap();
        assert!(close(draw.stock_mass, 2.0));
        assert!(close(draw.solvent_mass, 1.0));
        assert_eq!(draw.solvent_role, Role::OrganicSolvent);

        let solvent = sample.role(Role::OrganicSolvent);
        assert!(close(solvent.target_mass, 3.0));
        assert!(close(solvent.additional_solvent_mass(), 2.0));
    }

    #[test]
    fn stabilizer_stock_in_water() {
        let sample = OuzoSample::compute(g(10.0), &reference_roles()).unwrap();

        let stabilizer = sample.role(Role::Stabilizer1);
        let draw = stabilizer.stock_draw.as_ref().unwrap();
        assert!(close(draw.stock_mass, 5.0));
        assert!(close(draw.solvent_mass, 4.5));

        let water = sample.role(Role::Water);
        assert!(close(water.target_mass, 5.5));
        assert!(close(water.solvent_credit, 4.5));
        assert!(close(water.pure_mass().unwrap(), 1.0));
    }

    #[test]
    fn dispensed_masses_add_up() {
        let sample = OuzoSample::compute(g(10.0), &reference_roles()).unwrap();
        assert!(close(sample.dispensed_total(), 10.0));

        let lines = sample.dispense_lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].source, DispenseSource::Stock("oa_etoh".into()));
        assert_eq!(lines[3].source, DispenseSource::Pure("water".into()));
    }

    #[test]
    fn concentrated_demand_is_infeasible() {
        let mut roles = reference_roles();
        // 10 wt% hydrophobe from a 20 wt% stock carries 4 g ethanol into a 3 g budget
        roles.hydrophobe.stock = Some(
            Stock::new("oa_dilute", comp("oleic_acid"), comp("ethanol"), 0.2).unwrap(),
        );
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        match err {
            ChemError::InfeasibleComposition {
                role,
                budget_g,
                contributed_g,
            } => {
                assert_eq!(role, "organic_solvent");
                assert!((budget_g - 3.0).abs() < 1e-9);
                assert!((contributed_g - 4.0).abs() < 1e-9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn exact_solvent_budget_is_feasible() {
        let mut roles = reference_roles();
        roles.hydrophobe.stock = Some(
            Stock::new("oa_25", comp("oleic_acid"), comp("ethanol"), 0.25).unwrap(),
        );
        let sample = OuzoSample::compute(g(10.0), &roles).unwrap();
        assert!(close(
            sample.role(Role::OrganicSolvent).additional_solvent_mass(),
            0.0
        ));
        // nothing left to dispense neat
        assert!(
            sample
                .dispense_lines()
                .iter()
                .all(|line| line.role != Role::OrganicSolvent)
        );
    }

    #[test]
    fn unaccounted_solvent_is_rejected() {
        let mut roles = reference_roles();
        roles.hydrophobe.stock = Some(
            Stock::new("oa_in_oil", comp("oleic_acid"), comp("light_mineral_oil"), 0.5).unwrap(),
        );
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        assert!(matches!(err, ChemError::UnaccountedSolvent { .. }));
    }

    #[test]
    fn stock_must_carry_the_role_component() {
        let mut roles = reference_roles();
        roles.hydrophobe.stock = Some(
            Stock::new("geranic", comp("geranic_acid"), comp("ethanol"), 0.5).unwrap(),
        );
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        assert!(matches!(err, ChemError::InvalidStockComposition { .. }));
    }

    #[test]
    fn explicit_fractions_must_sum_to_one() {
        let mut roles = reference_roles();
        roles.water.weight_fraction = Some(0.2);
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        assert!(matches!(err, ChemError::InvalidWeightFractions { .. }));

        roles.water.weight_fraction = Some(0.55);
        assert!(OuzoSample::compute(g(10.0), &roles).is_ok());
    }

    #[test]
    fn only_one_remainder_role() {
        let mut roles = reference_roles();
        roles.organic_solvent.weight_fraction = None;
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        assert!(matches!(err, ChemError::InvalidWeightFractions { .. }));
    }

    #[test]
    fn overfull_fractions_leave_no_remainder() {
        let mut roles = reference_roles();
        roles.organic_solvent.weight_fraction = Some(0.9);
        let err = OuzoSample::compute(g(10.0), &roles).unwrap_err();
        assert!(matches!(err, ChemError::InvalidWeightFractions { .. }));
    }

    #[test]
    fn total_mass_must_be_positive() {
        let err = OuzoSample::compute(g(0.0), &reference_roles()).unwrap_err();
        assert!(matches!(err, ChemError::NonPhysical(_)));
    }

    #[test]
    fn volumes_need_densities() {
        let sample = OuzoSample::compute(g(10.0), &reference_roles()).unwrap();

        let err = sample
            .dispense_volumes(|source| match source {
                DispenseSource::Pure(name) if name == "water" => Some(oz_core::g_per_ml(1.0)),
                _ => None,
            })
            .unwrap_err();
        assert!(matches!(err, ChemError::MissingDensity { .. }));

        let volumes = sample
            .dispense_volumes(|_| Some(oz_core::g_per_ml(1.0)))
            .unwrap();
        let water = volumes
            .iter()
            .find(|(line, _)| line.role == Role::Water)
            .unwrap();
        assert!((oz_core::in_ul(water.1) - 1000.0).abs() < 1e-6);
    }
}
