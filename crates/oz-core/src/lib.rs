//! oz-core: stable foundation for the ouzo lab workspace.
//!
//! Contains:
//! - units (uom SI types + bench-scale constructors: grams, microliters, g/mL)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact handles for labware loaded on the deck)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::OzError;
pub use ids::*;
pub use numeric::*;
pub use units::*;
