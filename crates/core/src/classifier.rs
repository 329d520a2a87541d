//! Birth-year element classification.
//!
//! Two interleaved cycles anchored at 1984: a 10-year stem cycle and a
//! 12-year branch cycle. Their least common multiple makes the result
//! periodic over 60 years.

use crate::domain::element::{BirthYear, Element};

const ANCHOR_YEAR: i64 = 1984;
const STEM_CYCLE: i64 = 10;
const BRANCH_CYCLE: i64 = 12;

/// Element for element values 1..=5. Order matters.
const ELEMENT_BY_VALUE: [Element; 5] =
    [Element::Metal, Element::Water, Element::Fire, Element::Earth, Element::Wood];

/// Classify any year. Total over `i32`; range checks belong to callers
/// (see [`BirthYear`]).
pub fn classify(birth_year: i32) -> Element {
    let offset = i64::from(birth_year) - ANCHOR_YEAR;
    let stem_index = offset.rem_euclid(STEM_CYCLE);
    let branch_index = offset.rem_euclid(BRANCH_CYCLE);

    let stem_value = stem_index / 2 + 1;
    let branch_value = branch_value(branch_index);

    let raw = stem_value + branch_value;
    let element_value = if raw > 5 { raw - 5 } else { raw };

    ELEMENT_BY_VALUE[(element_value - 1) as usize]
}

pub fn classify_birth_year(birth_year: BirthYear) -> Element {
    classify(birth_year.value())
}

fn branch_value(branch_index: i64) -> i64 {
    match branch_index {
        0 | 1 | 6 | 7 => 0,
        2 | 3 | 8 | 9 => 1,
        _ => 2,
    }
}
