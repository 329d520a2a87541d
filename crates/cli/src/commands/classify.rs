use serde::Serialize;

use crate::commands::{validation_error, CommandResult};
use fengshui_core::classifier::classify_birth_year;
use fengshui_core::domain::element::{BirthYear, Element};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Classification {
    birth_year: BirthYear,
    element: Element,
    source_name: &'static str,
}

/// Pure computation; touches neither config nor database.
pub fn run(year: i32) -> CommandResult {
    let birth_year = match BirthYear::new(year) {
        Ok(birth_year) => birth_year,
        Err(errors) => {
            let (class, message, code) = validation_error(errors);
            return CommandResult::failure("classify", class, message, code);
        }
    };

    let element = classify_birth_year(birth_year);
    CommandResult::success_with_data(
        "classify",
        format!("{birth_year} classifies as {element}"),
        Classification { birth_year, element, source_name: element.source_name() },
    )
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::run;

    #[test]
    fn classifies_in_range_year() {
        let result = run(1990);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 0);
        assert_eq!(payload["data"]["element"], "Earth");
        assert_eq!(payload["data"]["birthYear"], 1990);
    }

    #[test]
    fn rejects_out_of_range_year() {
        let result = run(1899);
        let payload: Value = serde_json::from_str(&result.output).expect("json");

        assert_eq!(result.exit_code, 8);
        assert_eq!(payload["error_class"], "validation");
    }
}
