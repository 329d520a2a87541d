use std::fs;
use std::path::PathBuf;

use crate::commands::{engine_error, input_error, run_with_engine, CommandError, CommandResult};
use fengshui_core::domain::item::ItemId;
use fengshui_core::errors::EngineError;
use fengshui_core::store::CatalogStore;
use fengshui_db::fixtures::{import_catalog, CatalogImportError};

#[derive(Debug, Clone)]
pub enum CatalogAction {
    Import { file: PathBuf },
    Show { id: String },
}

pub fn run(action: CatalogAction) -> CommandResult {
    match action {
        CatalogAction::Import { file } => {
            let raw = match fs::read_to_string(&file) {
                Ok(raw) => raw,
                Err(error) => {
                    let (class, message, code) =
                        input_error(format!("could not read `{}`: {error}", file.display()));
                    return CommandResult::failure("catalog.import", class, message, code);
                }
            };
            run_with_engine("catalog.import", move |engine| async move {
                let report =
                    import_catalog(engine.catalog(), &raw).await.map_err(import_error)?;
                Ok::<_, CommandError>((format!("imported {} catalog items", report.imported), report))
            })
        }
        CatalogAction::Show { id } => run_with_engine("catalog.show", move |engine| async move {
            let item_id = ItemId(id);
            let item = engine
                .catalog()
                .find_by_id(&item_id)
                .await
                .map_err(|error| engine_error(EngineError::Store(error)))?
                .ok_or_else(|| {
                    engine_error(EngineError::NotFound { entity: "item", key: item_id.0.clone() })
                })?;
            Ok::<_, CommandError>((format!("catalog item {}", item.id.0), item))
        }),
    }
}

fn import_error(error: CatalogImportError) -> CommandError {
    match error {
        CatalogImportError::Parse(error) => input_error(format!("catalog is not valid JSON: {error}")),
        CatalogImportError::Invalid(errors) => engine_error(EngineError::Validation(errors)),
        CatalogImportError::Store(error) => engine_error(EngineError::Store(error)),
    }
}
