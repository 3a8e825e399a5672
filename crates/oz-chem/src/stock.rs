//! Stocks: pre-mixed solutions used as pipetting sources.

use crate::component::Component;
use crate::error::{ChemError, ChemResult};
use oz_core::units::{Mass, in_g};

/// A solute ("component A") dissolved in a solvent at a known weight fraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    name: String,
    solute: Component,
    solvent: Component,
    solute_wtf: f64,
}

impl Stock {
    /// Create a stock. The solute weight fraction must lie in (0, 1] and the
    /// solute and solvent must be different components.
    pub fn new(
        name: impl Into<String>,
        solute: Component,
        solvent: Component,
        solute_wtf: f64,
    ) -> ChemResult<Self> {
        let stock = Self {
            name: name.into(),
            solute,
            solvent,
            solute_wtf,
        };
        stock.validate()?;
        Ok(stock)
    }

    /// Check the composition before the weight fraction is used as a divisor.
    pub fn validate(&self) -> ChemResult<()> {
        if !self.solute_wtf.is_finite() || self.solute_wtf <= 0.0 || self.solute_wtf > 1.0 {
            return Err(self.invalid(format!(
                "solute weight fraction {} is outside (0, 1]",
                self.solute_wtf
            )));
        }
        if self.solute == self.solvent {
            return Err(self.invalid(format!(
                "solute and solvent are both {}",
                self.solute.name()
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn solute(&self) -> &Component {
        &self.solute
    }

    pub fn solvent(&self) -> &Component {
        &self.solvent
    }

    /// Weight fraction of the solute in the stock.
    pub fn solute_wtf(&self) -> f64 {
        self.solute_wtf
    }

    /// Mass of stock that carries `solute_mass` of solute.
    pub fn stock_mass_for(&self, solute_mass: Mass) -> ChemResult<Mass> {
        self.validate()?;
        Ok(solute_mass / self.solute_wtf)
    }

    pub(crate) fn invalid(&self, reason: String) -> ChemError {
        ChemError::InvalidStockComposition {
            stock: self.name.clone(),
            reason,
        }
    }
}

impl std::fmt::Display for Stock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:.4} {} in {})",
            self.name, self.solute_wtf, self.solute, self.solvent
        )
    }
}

/// Solvent carried alongside `solute_mass` when drawn from `stock`.
pub(crate) fn solvent_carried(stock_mass: Mass, solute_mass: Mass) -> f64 {
    in_g(stock_mass) - in_g(solute_mass)
}
