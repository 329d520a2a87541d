use async_trait::async_trait;
use sqlx::Row;
use tracing::debug;

use fengshui_core::domain::element::Element;
use fengshui_core::domain::rule::{ElementProfile, RuleId, RuleLifecycle, RuleRecord};
use fengshui_core::errors::StoreError;
use fengshui_core::store::{RecordScope, RuleStore};

use super::{bool_to_int, parse_timestamp, RepositoryError};
use crate::DbPool;

const RULE_COLUMNS: &str = "id, element, profile, is_active, created_at, updated_at, deleted_at";

/// Rule records in `element_rule`. The profile is one JSON document; the
/// partial unique index on `element WHERE is_active = 1` guards duplicates.
pub struct SqlRuleRepository {
    pool: DbPool,
}

impl SqlRuleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn insert_row(&self, record: &RuleRecord) -> Result<(), RepositoryError> {
        let profile = serde_json::to_string(&record.profile)?;

        sqlx::query(
            "INSERT INTO element_rule (id, element, profile, is_active, created_at, updated_at, deleted_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(record.element.as_str())
        .bind(profile)
        .bind(bool_to_int(record.is_active()))
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .bind(record.lifecycle.deleted_at().map(|timestamp| timestamp.to_rfc3339()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_active_by_element(
        &self,
        element: Element,
    ) -> Result<Option<RuleRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM element_rule WHERE element = ? AND is_active = 1"
        ))
        .bind(element.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_rule).transpose()
    }

    async fn fetch_active_by_birth_year(
        &self,
        birth_year: i32,
    ) -> Result<Option<RuleRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM element_rule r
             WHERE r.is_active = 1
               AND EXISTS (
                   SELECT 1 FROM json_each(r.profile, '$.birth_years') WHERE value = ?
               )
             ORDER BY r.element ASC
             LIMIT 1"
        ))
        .bind(birth_year)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_rule).transpose()
    }

    async fn update_active(&self, record: &RuleRecord) -> Result<bool, RepositoryError> {
        let profile = serde_json::to_string(&record.profile)?;

        let result = sqlx::query(
            "UPDATE element_rule
             SET profile = ?, is_active = ?, updated_at = ?, deleted_at = ?
             WHERE id = ? AND is_active = 1",
        )
        .bind(profile)
        .bind(bool_to_int(record.is_active()))
        .bind(record.updated_at.to_rfc3339())
        .bind(record.lifecycle.deleted_at().map(|timestamp| timestamp.to_rfc3339()))
        .bind(&record.id.0)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch_all(&self, scope: RecordScope) -> Result<Vec<RuleRecord>, RepositoryError> {
        let filter = match scope {
            RecordScope::ActiveOnly => "WHERE is_active = 1",
            RecordScope::IncludeDeleted => "",
        };
        let rows = sqlx::query(&format!(
            "SELECT {RULE_COLUMNS} FROM element_rule {filter} ORDER BY element ASC, created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_rule).collect()
    }

    async fn count_rows(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM element_rule")
            .fetch_one(&self.pool)
            .await?
            .try_get("count")?;

        u64::try_from(count).map_err(|error| RepositoryError::Decode(error.to_string()))
    }
}

fn row_to_rule(row: &sqlx::sqlite::SqliteRow) -> Result<RuleRecord, RepositoryError> {
    let decode = |error: sqlx::Error| RepositoryError::Decode(error.to_string());

    let id: String = row.try_get("id").map_err(decode)?;
    let element: String = row.try_get("element").map_err(decode)?;
    let profile: String = row.try_get("profile").map_err(decode)?;
    let is_active: i64 = row.try_get("is_active").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode)?;
    let deleted_at: Option<String> = row.try_get("deleted_at").map_err(decode)?;

    let element = element
        .parse::<Element>()
        .map_err(|error| RepositoryError::Decode(format!("element: {error}")))?;
    let profile = serde_json::from_str::<ElementProfile>(&profile)?;

    let lifecycle = if is_active == 1 {
        RuleLifecycle::Active
    } else {
        let deleted_at = deleted_at.ok_or_else(|| {
            RepositoryError::Decode(format!("rule {id} is inactive without deleted_at"))
        })?;
        RuleLifecycle::Deleted { deleted_at: parse_timestamp("deleted_at", &deleted_at)? }
    };

    Ok(RuleRecord {
        id: RuleId(id),
        element,
        profile,
        lifecycle,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait]
impl RuleStore for SqlRuleRepository {
    async fn insert(&self, record: RuleRecord) -> Result<(), StoreError> {
        self.insert_row(&record).await?;
        debug!(
            event_name = "store.rule.inserted",
            element = %record.element,
            rule_id = %record.id.0,
            "rule row inserted"
        );
        Ok(())
    }

    async fn find_active_by_element(
        &self,
        element: Element,
    ) -> Result<Option<RuleRecord>, StoreError> {
        Ok(self.fetch_active_by_element(element).await?)
    }

    async fn find_active_by_birth_year(
        &self,
        birth_year: i32,
    ) -> Result<Option<RuleRecord>, StoreError> {
        Ok(self.fetch_active_by_birth_year(birth_year).await?)
    }

    async fn replace_active(&self, record: RuleRecord) -> Result<bool, StoreError> {
        Ok(self.update_active(&record).await?)
    }

    async fn list(&self, scope: RecordScope) -> Result<Vec<RuleRecord>, StoreError> {
        Ok(self.fetch_all(scope).await?)
    }

    async fn count_all(&self) -> Result<u64, StoreError> {
        Ok(self.count_rows().await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use fengshui_core::domain::element::Element;
    use fengshui_core::domain::rule::{RuleLifecycle, RuleRecord};
    use fengshui_core::errors::StoreError;
    use fengshui_core::reference::ReferenceData;
    use fengshui_core::store::{RecordScope, RuleStore};

    use super::SqlRuleRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlRuleRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlRuleRepository::new(pool)
    }

    fn record(element: Element) -> RuleRecord {
        let reference = ReferenceData::embedded().expect("reference data");
        let draft = reference.get(element).expect("draft").clone();
        RuleRecord::from_draft(draft, Utc::now())
    }

    #[tokio::test]
    async fn insert_and_find_round_trip_profile() {
        let repo = repository().await;
        let wood = record(Element::Wood);

        repo.insert(wood.clone()).await.expect("insert");
        let found = repo.find_active_by_element(Element::Wood).await.expect("find");

        assert_eq!(found.as_ref().map(|rule| &rule.profile), Some(&wood.profile));
        assert_eq!(found.map(|rule| rule.id), Some(wood.id));
    }

    #[tokio::test]
    async fn second_active_record_for_element_is_a_unique_violation() {
        let repo = repository().await;
        repo.insert(record(Element::Fire)).await.expect("first insert");

        let error = repo.insert(record(Element::Fire)).await.expect_err("duplicate");

        assert!(matches!(error, StoreError::UniqueViolation(_)));
        assert_eq!(repo.count_all().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn soft_deleted_record_frees_the_element_slot() {
        let repo = repository().await;
        let mut metal = record(Element::Metal);
        repo.insert(metal.clone()).await.expect("insert");

        metal.lifecycle = RuleLifecycle::Deleted { deleted_at: Utc::now() };
        assert!(repo.replace_active(metal.clone()).await.expect("soft delete"));
        assert!(!repo.replace_active(metal).await.expect("second soft delete"));

        assert!(repo.find_active_by_element(Element::Metal).await.expect("find").is_none());
        repo.insert(record(Element::Metal)).await.expect("re-create after delete");

        assert_eq!(repo.list(RecordScope::ActiveOnly).await.expect("active").len(), 1);
        let all = repo.list(RecordScope::IncludeDeleted).await.expect("all");
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|rule| rule.lifecycle.deleted_at().is_some()).count(), 1);
    }

    #[tokio::test]
    async fn birth_year_lookup_reads_json_table() {
        let repo = repository().await;
        for element in Element::ALL {
            repo.insert(record(element)).await.expect("insert");
        }

        let found = repo.find_active_by_birth_year(1984).await.expect("lookup");
        assert_eq!(found.map(|rule| rule.element), Some(Element::Wood));

        let missing = repo.find_active_by_birth_year(1975).await.expect("lookup");
        assert!(missing.is_none());
    }
}
