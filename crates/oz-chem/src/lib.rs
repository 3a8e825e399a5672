//! oz-chem: sample composition for ouzo formulations.
//!
//! Provides:
//! - Components and a registry seeded from the built-in catalog
//! - Stocks (solute dissolved in a solvent at a known weight fraction)
//! - Role assignment for the four recipe slots
//!   (hydrophobe, organic solvent, stabilizer, water)
//! - `OuzoSample`, the composition calculator that back-solves stock
//!   dilutions against the solvent budget of the sample
//!
//! # Example
//!
//! ```
//! use oz_chem::{Component, ComponentRegistry, OuzoSample, RoleAssignment, RoleSpec, Stock};
//! use oz_core::units::{g, in_g};
//!
//! let mut registry = ComponentRegistry::with_builtins();
//! registry.register(Component::new("pluronic_f127", None).unwrap()).unwrap();
//! let oleic = registry.get("oleic_acid").unwrap().clone();
//! let ethanol = registry.get("ethanol").unwrap().clone();
//! let water = registry.get("water").unwrap().clone();
//!
//! let stock = Stock::new("oleic_in_ethanol", oleic.clone(), ethanol.clone(), 0.5).unwrap();
//! let roles = RoleAssignment {
//!     hydrophobe: RoleSpec::from_stock(oleic, 0.1, stock),
//!     organic_solvent: RoleSpec::pure(ethanol, Some(0.3)),
//!     stabilizer1: RoleSpec::pure(registry.get("pluronic_f127").unwrap().clone(), Some(0.01)),
//!     water: RoleSpec::pure(water, None),
//! };
//!
//! let sample = OuzoSample::compute(g(10.0), &roles).unwrap();
//! assert!((in_g(sample.dispensed_total()) - 10.0).abs() < 1e-9);
//! ```

pub mod catalog;
pub mod component;
pub mod error;
pub mod role;
pub mod sample;
pub mod stock;

// Re-exports for ergonomics
pub use catalog::{CatalogEntry, builtin_catalog, search_catalog};
pub use component::{Component, ComponentRegistry};
pub use error::{ChemError, ChemResult};
pub use role::{Role, RoleAssignment, RoleSpec};
pub use sample::{DispenseLine, DispenseSource, OuzoSample, RoleMasses, StockDraw};
pub use stock::Stock;
