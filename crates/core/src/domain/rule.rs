use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::element::Element;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    pub fn generate() -> Self {
        Self(format!("rule-{}", Uuid::new_v4()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub compatible: Vec<String>,
    #[serde(default)]
    pub beneficial: Vec<String>,
    #[serde(default)]
    pub avoid: Vec<String>,
}

/// Outgoing edges of one node in the element relation graph.
///
/// Each set is declared by the owning element only. Element A listing B does
/// not imply that B lists A.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRelations {
    #[serde(default)]
    pub compatible: BTreeSet<Element>,
    #[serde(default)]
    pub supporting: BTreeSet<Element>,
    #[serde(default)]
    pub supported_by: BTreeSet<Element>,
    #[serde(default)]
    pub conflicting: BTreeSet<Element>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    #[serde(default)]
    pub temperament: String,
    #[serde(default)]
    pub personality: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    #[serde(default)]
    pub career: Vec<String>,
    #[serde(default)]
    pub health: Vec<String>,
    #[serde(default)]
    pub relationship: Vec<String>,
    #[serde(default)]
    pub wealth: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub shapes: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub stones: Vec<String>,
    #[serde(default)]
    pub plants: Vec<String>,
}

/// Reference attributes of one element. Persisted as a single document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementProfile {
    #[serde(default)]
    pub birth_years: BTreeSet<i32>,
    #[serde(default)]
    pub colors: ColorPalette,
    #[serde(default)]
    pub lucky_directions: Vec<String>,
    #[serde(default)]
    pub lucky_numbers: Vec<i32>,
    #[serde(default)]
    pub relations: ElementRelations,
    #[serde(default)]
    pub characteristics: Characteristics,
    #[serde(default)]
    pub advice: Advice,
    #[serde(default)]
    pub suggestions: Suggestions,
}

/// Input for rule creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub element: Element,
    #[serde(flatten)]
    pub profile: ElementProfile,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RuleLifecycle {
    Active,
    Deleted { deleted_at: DateTime<Utc> },
}

impl RuleLifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { deleted_at } => Some(*deleted_at),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub id: RuleId,
    pub element: Element,
    pub profile: ElementProfile,
    pub lifecycle: RuleLifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RuleRecord {
    pub fn from_draft(draft: RuleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: RuleId::generate(),
            element: draft.element,
            profile: draft.profile,
            lifecycle: RuleLifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    pub fn draft(&self) -> RuleDraft {
        RuleDraft { element: self.element, profile: self.profile.clone() }
    }
}

/// Partial update for a rule. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePatch {
    #[serde(default)]
    pub birth_years: Option<BTreeSet<i32>>,
    #[serde(default)]
    pub compatible_colors: Option<Vec<String>>,
    #[serde(default)]
    pub beneficial_colors: Option<Vec<String>>,
    #[serde(default)]
    pub avoid_colors: Option<Vec<String>>,
    #[serde(default)]
    pub lucky_directions: Option<Vec<String>>,
    #[serde(default)]
    pub lucky_numbers: Option<Vec<i32>>,
    #[serde(default)]
    pub relations: Option<ElementRelations>,
    #[serde(default)]
    pub characteristics: Option<Characteristics>,
    #[serde(default)]
    pub advice: Option<Advice>,
    #[serde(default)]
    pub suggestions: Option<Suggestions>,
}

impl RulePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply_to(self, profile: &mut ElementProfile) {
        if let Some(birth_years) = self.birth_years {
            profile.birth_years = birth_years;
        }
        if let Some(compatible) = self.compatible_colors {
            profile.colors.compatible = compatible;
        }
        if let Some(beneficial) = self.beneficial_colors {
            profile.colors.beneficial = beneficial;
        }
        if let Some(avoid) = self.avoid_colors {
            profile.colors.avoid = avoid;
        }
        if let Some(lucky_directions) = self.lucky_directions {
            profile.lucky_directions = lucky_directions;
        }
        if let Some(lucky_numbers) = self.lucky_numbers {
            profile.lucky_numbers = lucky_numbers;
        }
        if let Some(relations) = self.relations {
            profile.relations = relations;
        }
        if let Some(characteristics) = self.characteristics {
            profile.characteristics = characteristics;
        }
        if let Some(advice) = self.advice {
            profile.advice = advice;
        }
        if let Some(suggestions) = self.suggestions {
            profile.suggestions = suggestions;
        }
    }
}
