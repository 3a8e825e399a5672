//! Composition errors.

use oz_core::OzError;
use thiserror::Error;

/// Result type for composition operations.
pub type ChemResult<T> = Result<T, ChemError>;

/// Errors raised while building components, stocks and samples.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChemError {
    /// A recipe role has no entry.
    #[error("Missing role: {role}")]
    MissingRole { role: &'static str },

    /// A recipe entry names a role that is not one of the four recognized roles.
    #[error("Unknown role: {name}")]
    UnknownRole { name: String },

    /// A recipe lists the same role twice.
    #[error("Duplicate role: {role}")]
    DuplicateRole { role: &'static str },

    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    #[error("Duplicate component: {name}")]
    DuplicateComponent { name: String },

    /// Stock weight fraction outside (0, 1], or stock inconsistent with its role.
    #[error("Invalid stock composition for {stock}: {reason}")]
    InvalidStockComposition { stock: String, reason: String },

    /// Role weight fractions do not describe a complete sample.
    #[error("Invalid weight fractions: {reason}")]
    InvalidWeightFractions { reason: String },

    /// A stock's solvent is not targeted by any other role, so its mass cannot be balanced.
    #[error("Solvent {solvent} of stock {stock} is not a role component of the sample")]
    UnaccountedSolvent { stock: String, solvent: String },

    /// A stock's solvent matches more than one role component.
    #[error("Solvent {solvent} of stock {stock} matches several roles")]
    AmbiguousSolvent { stock: String, solvent: String },

    /// The stock is too dilute for the solvent budget of the receiving role.
    #[error(
        "Infeasible composition: {role} budget is {budget_g} g but stocks contribute {contributed_g} g"
    )]
    InfeasibleComposition {
        role: &'static str,
        budget_g: f64,
        contributed_g: f64,
    },

    #[error("Missing density for {source_name}")]
    MissingDensity { source_name: String },

    #[error("Non-physical value: {0}")]
    NonPhysical(String),
}

impl From<OzError> for ChemError {
    fn from(err: OzError) -> Self {
        ChemError::NonPhysical(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ChemError::MissingRole { role: "water" };
        assert!(err.to_string().contains("water"));

        let err = ChemError::InfeasibleComposition {
            role: "organic_solvent",
            budget_g: 1.0,
            contributed_g: 3.0,
        };
        assert!(err.to_string().contains("organic_solvent"));
    }

    #[test]
    fn core_error_converts() {
        let core = OzError::NonFinite {
            what: "total mass",
            value: f64::NAN,
        };
        let err: ChemError = core.into();
        assert!(matches!(err, ChemError::NonPhysical(_)));
    }
}
