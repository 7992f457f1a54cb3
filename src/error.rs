// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for compliancebot
//!
//! Only caller misuse surfaces here. Problems found in the inspected markup
//! are recorded as violations and warnings, never as errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Unknown brand configuration: {id}. Available: {available}")]
    UnknownBrand { id: String, available: String },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No element matches {0}")]
    ElementNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report store is empty, nothing to export")]
    EmptyReportStore,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
