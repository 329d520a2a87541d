//! Personal analysis assembled from a resolved rule record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::element::{BirthYear, Element};
use crate::domain::rule::{Advice, Characteristics, ColorPalette, RuleRecord};
use crate::validation::{FieldViolation, ValidationErrors};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = ValidationErrors;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(ValidationErrors::single(FieldViolation::new(
                "gender",
                format!("unsupported gender `{other}` (expected male|female)"),
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusArea {
    Career,
    Health,
    Relationship,
    Wealth,
}

impl FocusArea {
    pub fn advice(self, advice: &Advice) -> &[String] {
        match self {
            Self::Career => &advice.career,
            Self::Health => &advice.health,
            Self::Relationship => &advice.relationship,
            Self::Wealth => &advice.wealth,
        }
    }
}

impl FromStr for FocusArea {
    type Err = ValidationErrors;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "career" => Ok(Self::Career),
            "health" => Ok(Self::Health),
            "relationship" => Ok(Self::Relationship),
            "wealth" => Ok(Self::Wealth),
            other => Err(ValidationErrors::single(FieldViolation::new(
                "focus_area",
                format!("unsupported focus area `{other}` (expected career|health|relationship|wealth)"),
            ))),
        }
    }
}

/// How the rule behind an analysis was found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleResolution {
    /// The year was listed in a rule's birth-year table.
    BirthYearTable,
    /// No table entry; the stem/branch formula picked the element.
    Formula,
}

impl fmt::Display for RuleResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BirthYearTable => f.write_str("birthYearTable"),
            Self::Formula => f.write_str("formula"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub gender: Option<Gender>,
    pub focus_area: Option<FocusArea>,
    pub preferences: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub birth_year: i32,
    pub element: Element,
    pub resolution: RuleResolution,
    pub colors: ColorPalette,
    pub directions: Vec<String>,
    pub numbers: Vec<i32>,
    pub materials: Vec<String>,
    pub shapes: Vec<String>,
    pub locations: Vec<String>,
    pub stones: Vec<String>,
    pub plants: Vec<String>,
    pub advice: Advice,
    pub characteristics: Characteristics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_area: Option<FocusArea>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personalized_advice: Option<Vec<String>>,
    pub narrative: String,
}

pub fn build_analysis(
    rule: &RuleRecord,
    birth_year: BirthYear,
    resolution: RuleResolution,
    request: &AnalysisRequest,
) -> AnalysisResult {
    let profile = &rule.profile;
    let personalized_advice =
        request.focus_area.map(|focus| focus.advice(&profile.advice).to_vec());

    AnalysisResult {
        birth_year: birth_year.value(),
        element: rule.element,
        resolution,
        colors: profile.colors.clone(),
        directions: profile.lucky_directions.clone(),
        numbers: profile.lucky_numbers.clone(),
        materials: profile.suggestions.materials.clone(),
        shapes: profile.suggestions.shapes.clone(),
        locations: profile.suggestions.locations.clone(),
        stones: profile.suggestions.stones.clone(),
        plants: profile.suggestions.plants.clone(),
        advice: profile.advice.clone(),
        characteristics: profile.characteristics.clone(),
        focus_area: request.focus_area,
        personalized_advice,
        narrative: narrative(rule, birth_year, request),
    }
}

fn narrative(rule: &RuleRecord, birth_year: BirthYear, request: &AnalysisRequest) -> String {
    let element = rule.element;
    let mut paragraphs = vec![format!(
        "Born in {birth_year}, you belong to the {element} element ({}).",
        element.source_name()
    )];

    let temperament = rule.profile.characteristics.temperament.trim();
    if !temperament.is_empty() {
        paragraphs.push(format!("Temperament: {temperament}"));
    }

    match request.gender {
        Some(Gender::Male) => paragraphs.push(format!(
            "As a man of the {element} element, build on your leadership and decisiveness."
        )),
        Some(Gender::Female) => paragraphs.push(format!(
            "As a woman of the {element} element, cultivate your refinement and your ability to listen."
        )),
        None => {}
    }

    let has_preferences =
        request.preferences.as_deref().map(|value| !value.trim().is_empty()).unwrap_or(false);
    if has_preferences {
        paragraphs.push(
            [
                "Suggestions for your preferences:",
                "- Use compatible and beneficial colors to attract prosperity.",
                "- Arrange your home and desk toward your lucky directions.",
                "- Use your lucky numbers when choosing dates, phone numbers or plates.",
            ]
            .join("\n"),
        );
    }

    paragraphs.join("\n\n")
}
