use thiserror::Error;

use crate::domain::element::Element;
use crate::validation::ValidationErrors;

/// Failures reported by store ports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
    #[error("record rejected by store: {0}")]
    Invalid(ValidationErrors),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("an active rule for element {0} already exists")]
    DuplicateRule(Element),
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    pub fn rule_not_found(element: Element) -> Self {
        Self::NotFound { entity: "rule", key: element.to_string() }
    }

    /// Stable, machine-readable class for the caller-facing layer.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::Store(StoreError::Invalid(_)) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::DuplicateRule(_) => "duplicate_rule",
            Self::DataIntegrity(_) => "data_integrity",
            Self::Store(_) => "store",
        }
    }
}
