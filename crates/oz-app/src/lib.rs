//! Shared application service layer for the ouzo lab tools.
//!
//! Turns a validated protocol file into domain objects: component registries,
//! computed samples, a loaded deck, dispensing plans and calibration sweeps.
//! The CLI is a thin shell over these functions.

pub mod error;
pub mod protocol_service;
pub mod run_service;
pub mod sample_service;

// Re-export key types for convenience
pub use error::{AppError, AppResult};
pub use protocol_service::{ProtocolSummary, load_protocol, summarize, validate_protocol};
pub use run_service::{
    DeckSetup, RunOutcome, dispense_config, plan_dispense, preview_dispense, run_calibration,
    run_dispense, setup_deck,
};
pub use sample_service::{
    SampleOutcome, SampleReport, build_registry, build_stocks, compute_sample, compute_samples,
};
