pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use fixtures::{import_catalog, load_demo_catalog, CatalogImportError, ImportReport};
pub use repositories::{
    InMemoryCatalogRepository, InMemoryRuleRepository, RepositoryError, SqlCatalogRepository,
    SqlRuleRepository,
};
