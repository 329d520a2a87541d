use crate::commands::{
    engine_error, run_with_engine, validation_error, CommandError, CommandResult,
};
use fengshui_core::domain::element::Element;
use fengshui_core::validation::ValidationErrors;

#[derive(Debug, Clone)]
pub enum CompatibilityQuery {
    Pair { first: String, second: String },
    Matrix,
}

pub fn run(query: CompatibilityQuery) -> CommandResult {
    match query {
        CompatibilityQuery::Matrix => run_with_engine("compatibility", |engine| async move {
            let matrix = engine.compatibility_matrix().await.map_err(engine_error)?;
            Ok::<_, CommandError>((format!("{} directional relations", matrix.len()), matrix))
        }),
        CompatibilityQuery::Pair { first, second } => {
            let (first, second) = match parse_pair(&first, &second) {
                Ok(pair) => pair,
                Err(errors) => {
                    let (class, message, code) = validation_error(errors);
                    return CommandResult::failure("compatibility", class, message, code);
                }
            };
            run_with_engine("compatibility", move |engine| async move {
                let result = engine.compatibility(first, second).await.map_err(engine_error)?;
                Ok::<_, CommandError>((result.description.clone(), result))
            })
        }
    }
}

fn parse_pair(first: &str, second: &str) -> Result<(Element, Element), ValidationErrors> {
    match (first.parse::<Element>(), second.parse::<Element>()) {
        (Ok(first), Ok(second)) => Ok((first, second)),
        (first, second) => {
            let mut errors = ValidationErrors::default();
            for (field, result) in [("element_a", first), ("element_b", second)] {
                if let Err(found) = result {
                    for violation in found.violations() {
                        errors.push(field, violation.message.clone());
                    }
                }
            }
            Err(errors)
        }
    }
}
