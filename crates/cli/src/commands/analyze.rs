use crate::commands::{engine_error, run_with_engine, validation_error, CommandError, CommandResult};
use fengshui_core::analysis::{AnalysisRequest, FocusArea, Gender};
use fengshui_core::domain::element::BirthYear;
use fengshui_core::validation::ValidationErrors;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub year: i32,
    pub gender: Option<String>,
    pub focus: Option<String>,
    pub preferences: Option<String>,
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let (birth_year, request) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(errors) => {
            let (class, message, code) = validation_error(errors);
            return CommandResult::failure("analyze", class, message, code);
        }
    };

    run_with_engine("analyze", |engine| async move {
        let analysis = engine.analyze(birth_year, &request).await.map_err(engine_error)?;
        let message = format!(
            "{} belongs to the {} element (resolved via {})",
            analysis.birth_year, analysis.element, analysis.resolution
        );
        Ok::<_, CommandError>((message, analysis))
    })
}

/// Collects every argument problem before reporting.
fn parse_args(args: &AnalyzeArgs) -> Result<(BirthYear, AnalysisRequest), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let birth_year = BirthYear::new(args.year).map_err(|e| absorb(&mut errors, e)).ok();
    let gender = match args.gender.as_deref() {
        Some(raw) => raw.parse::<Gender>().map_err(|e| absorb(&mut errors, e)).ok(),
        None => None,
    };
    let focus_area = match args.focus.as_deref() {
        Some(raw) => raw.parse::<FocusArea>().map_err(|e| absorb(&mut errors, e)).ok(),
        None => None,
    };

    match birth_year {
        Some(birth_year) if errors.is_empty() => Ok((
            birth_year,
            AnalysisRequest { gender, focus_area, preferences: args.preferences.clone() },
        )),
        _ => Err(errors),
    }
}

fn absorb(errors: &mut ValidationErrors, found: ValidationErrors) {
    for violation in found.violations() {
        errors.push(violation.field.clone(), violation.message.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_args, AnalyzeArgs};
    use fengshui_core::analysis::{FocusArea, Gender};

    #[test]
    fn parses_optional_arguments() {
        let args = AnalyzeArgs {
            year: 1988,
            gender: Some("female".to_string()),
            focus: Some("Wealth".to_string()),
            preferences: Some("minimalist".to_string()),
        };

        let (year, request) = parse_args(&args).expect("valid args");

        assert_eq!(year.value(), 1988);
        assert_eq!(request.gender, Some(Gender::Female));
        assert_eq!(request.focus_area, Some(FocusArea::Wealth));
    }

    #[test]
    fn reports_all_invalid_arguments() {
        let args = AnalyzeArgs {
            year: 2300,
            gender: Some("unknown".to_string()),
            focus: Some("fame".to_string()),
            preferences: None,
        };

        let errors = parse_args(&args).expect_err("invalid args");
        let fields =
            errors.violations().iter().map(|violation| violation.field.as_str()).collect::<Vec<_>>();

        assert_eq!(fields, vec!["birth_year", "gender", "focus_area"]);
    }
}
