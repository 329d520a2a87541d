use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::validation::{FieldViolation, ValidationErrors};

pub const MIN_BIRTH_YEAR: i32 = 1900;
pub const MAX_BIRTH_YEAR: i32 = 2100;

/// The five symbolic elements. Closed set: no sixth value is representable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    #[serde(alias = "Kim")]
    Metal,
    #[serde(alias = "Mộc")]
    Wood,
    #[serde(alias = "Thủy")]
    Water,
    #[serde(alias = "Hỏa")]
    Fire,
    #[serde(alias = "Thổ")]
    Earth,
}

impl Element {
    pub const ALL: [Element; 5] =
        [Element::Metal, Element::Wood, Element::Water, Element::Fire, Element::Earth];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metal => "Metal",
            Self::Wood => "Wood",
            Self::Water => "Water",
            Self::Fire => "Fire",
            Self::Earth => "Earth",
        }
    }

    /// Name used by the Vietnamese reference data.
    pub fn source_name(self) -> &'static str {
        match self {
            Self::Metal => "Kim",
            Self::Wood => "Mộc",
            Self::Water => "Thủy",
            Self::Fire => "Hỏa",
            Self::Earth => "Thổ",
        }
    }

    /// Position in [`Element::ALL`]; used to index per-element tables.
    pub fn index(self) -> usize {
        match self {
            Self::Metal => 0,
            Self::Wood => 1,
            Self::Water => 2,
            Self::Fire => 3,
            Self::Earth => 4,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = ValidationErrors;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Element::ALL
            .into_iter()
            .find(|element| {
                element.as_str().eq_ignore_ascii_case(trimmed) || element.source_name() == trimmed
            })
            .ok_or_else(|| {
                ValidationErrors::single(FieldViolation::new(
                    "element",
                    format!(
                        "unknown element `{trimmed}` (expected one of Metal, Wood, Water, Fire, Earth)"
                    ),
                ))
            })
    }
}

/// A birth year inside the supported `1900..=2100` window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BirthYear(i32);

impl BirthYear {
    pub fn new(year: i32) -> Result<Self, ValidationErrors> {
        if (MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(&year) {
            Ok(Self(year))
        } else {
            Err(ValidationErrors::single(FieldViolation::new(
                "birth_year",
                format!("birth year {year} must be within {MIN_BIRTH_YEAR}..={MAX_BIRTH_YEAR}"),
            )))
        }
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for BirthYear {
    type Error = ValidationErrors;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for BirthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{BirthYear, Element};

    #[test]
    fn parses_canonical_and_source_names() {
        assert_eq!("metal".parse::<Element>().expect("metal"), Element::Metal);
        assert_eq!(" Fire ".parse::<Element>().expect("fire"), Element::Fire);
        assert_eq!("Mộc".parse::<Element>().expect("moc"), Element::Wood);
        assert_eq!("Thủy".parse::<Element>().expect("thuy"), Element::Water);
    }

    #[test]
    fn rejects_unknown_element_with_validation_error() {
        let error = "Aether".parse::<Element>().expect_err("unknown element");
        assert_eq!(error.violations().len(), 1);
        assert_eq!(error.violations()[0].field, "element");
    }

    #[test]
    fn serde_accepts_source_name_aliases() {
        let parsed: Vec<Element> =
            serde_json::from_str(r#"["Kim", "Hỏa", "Earth"]"#).expect("deserialize");
        assert_eq!(parsed, vec![Element::Metal, Element::Fire, Element::Earth]);
    }

    #[test]
    fn birth_year_window_is_inclusive() {
        assert!(BirthYear::new(1900).is_ok());
        assert!(BirthYear::new(2100).is_ok());
        assert!(BirthYear::new(1899).is_err());
        assert!(BirthYear::new(2101).is_err());
    }
}
