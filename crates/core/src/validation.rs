//! Field-level validation for rule drafts and catalog items.
//!
//! Validators never stop at the first problem: every violated constraint is
//! collected so callers can report them together.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::element::{MAX_BIRTH_YEAR, MIN_BIRTH_YEAR};
use crate::domain::item::Item;
use crate::domain::rule::RuleDraft;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn single(violation: FieldViolation) -> Self {
        Self { violations: vec![violation] }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered =
            self.violations.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        f.write_str(&rendered)
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_rule_draft(draft: &RuleDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    let profile = &draft.profile;

    if profile.birth_years.is_empty() {
        errors.push("birth_years", "at least one birth year is required");
    }
    for year in &profile.birth_years {
        if !(MIN_BIRTH_YEAR..=MAX_BIRTH_YEAR).contains(year) {
            errors.push(
                "birth_years",
                format!("birth year {year} must be within {MIN_BIRTH_YEAR}..={MAX_BIRTH_YEAR}"),
            );
        }
    }

    require_entries(&mut errors, "colors.compatible", &profile.colors.compatible);
    require_entries(&mut errors, "colors.beneficial", &profile.colors.beneficial);
    require_entries(&mut errors, "colors.avoid", &profile.colors.avoid);
    require_entries(&mut errors, "lucky_directions", &profile.lucky_directions);

    errors.into_result()
}

pub fn validate_item(item: &Item) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if item.id.0.trim().is_empty() {
        errors.push("id", "item id is required");
    }
    if item.name.trim().chars().count() < 2 {
        errors.push("name", "item name must have at least 2 characters");
    }
    if item.category.trim().is_empty() {
        errors.push("category", "item category is required");
    }
    require_entries(&mut errors, "colors", &item.colors);
    if item.elements.is_empty() {
        errors.push("elements", "item must belong to at least one element");
    }
    if item.price <= Decimal::ZERO {
        errors.push("price", "item price must be greater than zero");
    }
    if !item.rating.is_finite() || item.rating < 0.0 {
        errors.push("rating", "item rating must be a finite value >= 0");
    }

    errors.into_result()
}

fn require_entries(errors: &mut ValidationErrors, field: &str, values: &[String]) {
    if values.is_empty() {
        errors.push(field, "at least one entry is required");
    } else if values.iter().any(|value| value.trim().is_empty()) {
        errors.push(field, "entries must not be blank");
    }
}
