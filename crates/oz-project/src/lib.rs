//! oz-project: protocol file format and validation.
//!
//! A protocol file replaces the literal constants of a robot script: the
//! components and stocks on hand, the samples to compute, the deck layout,
//! the pipettes, and the dispensing or calibration run to perform.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_protocol};

/// Newest protocol file version understood by this crate.
pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<ProtocolFile> {
    let content = std::fs::read_to_string(path)?;
    let protocol: ProtocolFile = serde_yaml::from_str(&content)?;
    validate_protocol(&protocol)?;
    Ok(protocol)
}

pub fn save_yaml(path: &std::path::Path, protocol: &ProtocolFile) -> ProjectResult<()> {
    validate_protocol(protocol)?;
    let content = serde_yaml::to_string(protocol)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<ProtocolFile> {
    let content = std::fs::read_to_string(path)?;
    let protocol: ProtocolFile = serde_json::from_str(&content)?;
    validate_protocol(&protocol)?;
    Ok(protocol)
}

pub fn save_json(path: &std::path::Path, protocol: &ProtocolFile) -> ProjectResult<()> {
    validate_protocol(protocol)?;
    let content = serde_json::to_string_pretty(protocol)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<ProtocolFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
