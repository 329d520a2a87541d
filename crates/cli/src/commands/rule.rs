use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::commands::{
    engine_error, input_error, run_with_engine, validation_error, CommandError, CommandResult,
};
use fengshui_core::domain::element::Element;
use fengshui_core::domain::rule::{RuleDraft, RulePatch};
use fengshui_core::errors::EngineError;
use fengshui_core::store::{RecordScope, RuleStore};

#[derive(Debug, Clone)]
pub enum RuleAction {
    Show { element: String },
    List { include_deleted: bool },
    ByYear { year: i32 },
    Create { file: PathBuf },
    Update { element: String, file: PathBuf },
    Delete { element: String },
}

pub fn run(action: RuleAction) -> CommandResult {
    match action {
        RuleAction::Show { element } => with_element("rule.show", element, |element| {
            run_with_engine("rule.show", move |engine| async move {
                let rule = engine.get_rule(element).await.map_err(engine_error)?;
                Ok::<_, CommandError>((format!("active rule for {element}"), rule))
            })
        }),
        RuleAction::List { include_deleted } => run_with_engine("rule.list", move |engine| async move {
            let rules = if include_deleted {
                engine
                    .rules()
                    .list(RecordScope::IncludeDeleted)
                    .await
                    .map_err(|error| engine_error(EngineError::Store(error)))?
            } else {
                engine.list_rules().await.map_err(engine_error)?
            };
            Ok::<_, CommandError>((format!("{} rules", rules.len()), rules))
        }),
        RuleAction::ByYear { year } => run_with_engine("rule.by_year", move |engine| async move {
            let rule = engine.get_rule_by_birth_year(year).await.map_err(engine_error)?;
            Ok::<_, CommandError>((format!("birth year {year} is listed under {}", rule.element), rule))
        }),
        RuleAction::Create { file } => {
            let draft = match read_document::<RuleDraft>(&file) {
                Ok(draft) => draft,
                Err(error) => return failure("rule.create", error),
            };
            run_with_engine("rule.create", move |engine| async move {
                let rule = engine.create_rule(draft).await.map_err(engine_error)?;
                Ok::<_, CommandError>((format!("created rule {} for {}", rule.id.0, rule.element), rule))
            })
        }
        RuleAction::Update { element, file } => with_element("rule.update", element, |element| {
            let patch = match read_document::<RulePatch>(&file) {
                Ok(patch) => patch,
                Err(error) => return failure("rule.update", error),
            };
            run_with_engine("rule.update", move |engine| async move {
                let rule = engine.update_rule(element, patch).await.map_err(engine_error)?;
                Ok::<_, CommandError>((format!("updated rule for {element}"), rule))
            })
        }),
        RuleAction::Delete { element } => with_element("rule.delete", element, |element| {
            run_with_engine("rule.delete", move |engine| async move {
                let rule = engine.delete_rule(element).await.map_err(engine_error)?;
                Ok::<_, CommandError>((format!("soft-deleted rule for {element}"), rule))
            })
        }),
    }
}

fn with_element(
    command: &str,
    raw: String,
    action: impl FnOnce(Element) -> CommandResult,
) -> CommandResult {
    match raw.parse::<Element>() {
        Ok(element) => action(element),
        Err(errors) => failure(command, validation_error(errors)),
    }
}

fn failure(command: &str, (class, message, code): CommandError) -> CommandResult {
    CommandResult::failure(command, class, message, code)
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, CommandError> {
    let raw = fs::read_to_string(path)
        .map_err(|error| input_error(format!("could not read `{}`: {error}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|error| input_error(format!("could not parse `{}`: {error}", path.display())))
}
