//! Canonical per-element rule records.
//!
//! The records live in `config/reference/element_rules.toml`, embedded at
//! build time and optionally replaced by a file named in configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::element::Element;
use crate::domain::rule::RuleDraft;
use crate::validation::{validate_rule_draft, ValidationErrors};

pub const EMBEDDED_ELEMENT_RULES: &str =
    include_str!("../../../config/reference/element_rules.toml");

#[derive(Debug, Error)]
pub enum ReferenceDataError {
    #[error("could not read reference data `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse reference data: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("reference data is invalid: {0}")]
    Invalid(ValidationErrors),
}

#[derive(Debug, Deserialize)]
struct ReferenceFile {
    #[serde(default)]
    rule: Vec<RuleDraft>,
}

/// Exactly one validated draft per element, in [`Element::ALL`] order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceData {
    drafts: Vec<RuleDraft>,
}

impl ReferenceData {
    pub fn embedded() -> Result<Self, ReferenceDataError> {
        Self::parse(EMBEDDED_ELEMENT_RULES)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ReferenceDataError> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path).map_err(|source| {
                    ReferenceDataError::ReadFile { path: path.to_path_buf(), source }
                })?;
                Self::parse(&raw)
            }
            None => Self::embedded(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ReferenceDataError> {
        let file = toml::from_str::<ReferenceFile>(raw)?;
        let mut errors = ValidationErrors::default();

        for element in Element::ALL {
            let count = file.rule.iter().filter(|draft| draft.element == element).count();
            if count != 1 {
                errors.push(
                    format!("rule[{element}]"),
                    format!("expected exactly one record, found {count}"),
                );
            }
        }

        for draft in &file.rule {
            if let Err(draft_errors) = validate_rule_draft(draft) {
                for violation in draft_errors.violations() {
                    errors.push(
                        format!("rule[{}].{}", draft.element, violation.field),
                        violation.message.clone(),
                    );
                }
            }
        }

        if !errors.is_empty() {
            return Err(ReferenceDataError::Invalid(errors));
        }

        let mut drafts = file.rule;
        drafts.sort_by_key(|draft| draft.element.index());
        Ok(Self { drafts })
    }

    pub fn drafts(&self) -> &[RuleDraft] {
        &self.drafts
    }

    pub fn get(&self, element: Element) -> Option<&RuleDraft> {
        self.drafts.iter().find(|draft| draft.element == element)
    }
}
