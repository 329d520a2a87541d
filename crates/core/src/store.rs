//! Persistence ports consumed by the engine.

use async_trait::async_trait;

use crate::domain::element::Element;
use crate::domain::item::{CandidateQuery, Item, ItemId};
use crate::domain::rule::RuleRecord;
use crate::errors::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordScope {
    ActiveOnly,
    IncludeDeleted,
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Must reject a second active record for the same element with
    /// [`StoreError::UniqueViolation`], atomically with the insert.
    async fn insert(&self, record: RuleRecord) -> Result<(), StoreError>;

    async fn find_active_by_element(
        &self,
        element: Element,
    ) -> Result<Option<RuleRecord>, StoreError>;

    async fn find_active_by_birth_year(
        &self,
        birth_year: i32,
    ) -> Result<Option<RuleRecord>, StoreError>;

    /// Replace the active record carrying `record.id`. Returns `false` when no
    /// active record with that id exists.
    async fn replace_active(&self, record: RuleRecord) -> Result<bool, StoreError>;

    async fn list(&self, scope: RecordScope) -> Result<Vec<RuleRecord>, StoreError>;

    /// Count of every record, deleted ones included.
    async fn count_all(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Items failing `validate_item` are refused with [`StoreError::Invalid`].
    async fn save(&self, item: Item) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, StoreError>;

    /// Active, in-stock items narrowed by `query`. Order is unspecified.
    async fn rank_candidates(&self, query: &CandidateQuery) -> Result<Vec<Item>, StoreError>;
}
