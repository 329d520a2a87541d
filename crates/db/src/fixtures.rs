//! Catalog import from JSON documents, including the bundled demo catalog.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use fengshui_core::domain::item::Item;
use fengshui_core::errors::StoreError;
use fengshui_core::store::CatalogStore;
use fengshui_core::validation::{validate_item, ValidationErrors};

pub const DEMO_CATALOG: &str = include_str!("../../../config/fixtures/demo_catalog.json");

#[derive(Debug, Error)]
pub enum CatalogImportError {
    #[error("catalog document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog contains invalid items: {0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub item_ids: Vec<String>,
}

/// Parse a JSON array of items. Every invalid item is reported, not only the
/// first; nothing is returned unless all items pass.
pub fn parse_catalog(raw: &str) -> Result<Vec<Item>, CatalogImportError> {
    let items = serde_json::from_str::<Vec<Item>>(raw)?;
    let mut errors = ValidationErrors::default();

    for (position, item) in items.iter().enumerate() {
        if let Err(item_errors) = validate_item(item) {
            let label = if item.id.0.trim().is_empty() {
                format!("item[{position}]")
            } else {
                format!("item[{}]", item.id.0)
            };
            for violation in item_errors.violations() {
                errors.push(format!("{label}.{}", violation.field), violation.message.clone());
            }
        }
    }

    errors.into_result().map_err(CatalogImportError::Invalid)?;
    Ok(items)
}

pub async fn import_catalog<C>(store: &C, raw: &str) -> Result<ImportReport, CatalogImportError>
where
    C: CatalogStore + ?Sized,
{
    let items = parse_catalog(raw)?;
    let mut item_ids = Vec::with_capacity(items.len());

    for item in items {
        item_ids.push(item.id.0.clone());
        store.save(item).await?;
    }

    info!(event_name = "catalog.import.completed", imported = item_ids.len(), "catalog imported");
    Ok(ImportReport { imported: item_ids.len(), item_ids })
}

pub async fn load_demo_catalog<C>(store: &C) -> Result<ImportReport, CatalogImportError>
where
    C: CatalogStore + ?Sized,
{
    import_catalog(store, DEMO_CATALOG).await
}
