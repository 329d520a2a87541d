use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use fengshui_core::domain::element::Element;
use fengshui_core::domain::item::{CandidateQuery, Item, ItemId};
use fengshui_core::domain::rule::RuleRecord;
use fengshui_core::errors::StoreError;
use fengshui_core::store::{CatalogStore, RecordScope, RuleStore};
use fengshui_core::validation::validate_item;

/// Rule records kept in insertion order. The write lock makes the
/// active-element check and the insert one step.
#[derive(Default)]
pub struct InMemoryRuleRepository {
    records: RwLock<Vec<RuleRecord>>,
}

#[async_trait]
impl RuleStore for InMemoryRuleRepository {
    async fn insert(&self, record: RuleRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if record.is_active()
            && records.iter().any(|existing| existing.is_active() && existing.element == record.element)
        {
            return Err(StoreError::UniqueViolation(format!(
                "active rule for element {} already exists",
                record.element
            )));
        }
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(StoreError::UniqueViolation(format!("rule id {} already exists", record.id.0)));
        }
        records.push(record);
        Ok(())
    }

    async fn find_active_by_element(
        &self,
        element: Element,
    ) -> Result<Option<RuleRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.is_active() && record.element == element).cloned())
    }

    async fn find_active_by_birth_year(
        &self,
        birth_year: i32,
    ) -> Result<Option<RuleRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .filter(|record| record.is_active() && record.profile.birth_years.contains(&birth_year))
            .min_by_key(|record| record.element.as_str())
            .cloned())
    }

    async fn replace_active(&self, record: RuleRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|existing| existing.is_active() && existing.id == record.id) {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self, scope: RecordScope) -> Result<Vec<RuleRecord>, StoreError> {
        let records = self.records.read().await;
        let mut listed = records
            .iter()
            .filter(|record| scope == RecordScope::IncludeDeleted || record.is_active())
            .cloned()
            .collect::<Vec<_>>();
        listed.sort_by(|left, right| {
            left.element.as_str().cmp(right.element.as_str()).then(left.created_at.cmp(&right.created_at))
        });
        Ok(listed)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        Ok(records.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: RwLock<HashMap<String, Item>>,
}

#[async_trait]
impl CatalogStore for InMemoryCatalogRepository {
    async fn save(&self, item: Item) -> Result<(), StoreError> {
        validate_item(&item).map_err(StoreError::Invalid)?;
        let mut items = self.items.write().await;
        items.insert(item.id.0.clone(), item);
        Ok(())
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        let items = self.items.read().await;
        Ok(items.get(&id.0).cloned())
    }

    async fn rank_candidates(&self, query: &CandidateQuery) -> Result<Vec<Item>, StoreError> {
        let items = self.items.read().await;
        Ok(items.values().filter(|item| query.matches(item)).cloned().collect())
    }
}
