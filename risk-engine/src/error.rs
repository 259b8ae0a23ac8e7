//! Error types for risk engine

use thiserror::Error;

/// Rejected input at the engine boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Vessel age below zero
    #[error("Vessel age must be >= 0, got {0}")]
    NegativeAge(f64),

    /// Vessel age is NaN or infinite
    #[error("Vessel age must be a finite number")]
    NonFiniteAge,

    /// Inspection count below zero
    #[error("{field} must be >= 0, got {value}")]
    NegativeCount {
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: i64,
    },

    /// Inspection count does not fit the counter type
    #[error("{field} is out of range: {value}")]
    CountOutOfRange {
        /// Offending field
        field: &'static str,
        /// Value supplied
        value: i64,
    },

    /// More detentions than inspections
    #[error("detention_count ({detentions}) exceeds total_inspections ({inspections})")]
    DetentionsExceedInspections {
        /// Detentions recorded
        detentions: u32,
        /// Inspections recorded
        inspections: u32,
    },

    /// Vessel id is blank
    #[error("Vessel id must not be empty")]
    EmptyVesselId,

    /// Scenario parameter is NaN or infinite
    #[error("Scenario parameter {0} must be a finite number")]
    NonFiniteParameter(&'static str),

    /// Flag-state risk outside [0, 1]
    #[error("Flag risk for '{flag_state}' must be within [0, 1], got {value}")]
    FlagRiskOutOfRange {
        /// Flag state key
        flag_state: String,
        /// Value supplied
        value: f64,
    },
}

/// Risk engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Vessel id not present in the fleet
    #[error("Vessel not found: {0}")]
    VesselNotFound(String),

    /// Vessel id appears more than once
    #[error("Duplicate vessel id: {0}")]
    DuplicateVessel(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
