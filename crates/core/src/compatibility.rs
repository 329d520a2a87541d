//! Directional compatibility between two elements.
//!
//! The relation is read from the first element's rule only, so
//! `compatibility(a, b)` and `compatibility(b, a)` may legitimately differ.

use serde::{Deserialize, Serialize};

use crate::domain::element::Element;
use crate::domain::rule::RuleRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    Compatible,
    Supporting,
    SupportedBy,
    Conflicting,
    Neutral,
}

impl RelationKind {
    pub fn score(self) -> i32 {
        match self {
            Self::SupportedBy => 10,
            Self::Supporting => 8,
            Self::Compatible => 6,
            Self::Neutral => 0,
            Self::Conflicting => -5,
        }
    }

    pub fn describe(self, first: Element, second: Element) -> String {
        match self {
            Self::Compatible => format!("{first} and {second} are compatible"),
            Self::Supporting => format!("{first} supports {second}"),
            Self::SupportedBy => format!("{first} is supported by {second}"),
            Self::Conflicting => format!("{first} and {second} conflict"),
            Self::Neutral => format!("{first} and {second} interact neutrally"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub element_a: Element,
    pub element_b: Element,
    pub relation_kind: RelationKind,
    pub score: i32,
    pub description: String,
}

/// Resolve the relation from `rule.element` towards `other`. First match wins:
/// compatible, supporting, supported-by, conflicting, otherwise neutral.
pub fn relation_from(rule: &RuleRecord, other: Element) -> CompatibilityResult {
    let relations = &rule.profile.relations;
    let relation_kind = if relations.compatible.contains(&other) {
        RelationKind::Compatible
    } else if relations.supporting.contains(&other) {
        RelationKind::Supporting
    } else if relations.supported_by.contains(&other) {
        RelationKind::SupportedBy
    } else if relations.conflicting.contains(&other) {
        RelationKind::Conflicting
    } else {
        RelationKind::Neutral
    };

    CompatibilityResult {
        element_a: rule.element,
        element_b: other,
        relation_kind,
        score: relation_kind.score(),
        description: relation_kind.describe(rule.element, other),
    }
}
