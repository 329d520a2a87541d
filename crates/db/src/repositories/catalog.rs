use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::Row;

use fengshui_core::domain::element::Element;
use fengshui_core::domain::item::{CandidateQuery, Item, ItemId};
use fengshui_core::errors::StoreError;
use fengshui_core::store::CatalogStore;
use fengshui_core::validation::validate_item;

use super::{bool_to_int, parse_timestamp, RepositoryError};
use crate::DbPool;

const ITEM_COLUMNS: &str = "id, name, category, colors, elements, price, rating, sold_count, stock,
                            is_active, created_at, updated_at";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn upsert(&self, item: &Item) -> Result<(), RepositoryError> {
        let colors = serde_json::to_string(&item.colors)?;
        let elements = serde_json::to_string(&item.elements)?;

        sqlx::query(
            "INSERT INTO catalog_item (id, name, category, colors, elements, price, rating,
                                       sold_count, stock, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 category = excluded.category,
                 colors = excluded.colors,
                 elements = excluded.elements,
                 price = excluded.price,
                 rating = excluded.rating,
                 sold_count = excluded.sold_count,
                 stock = excluded.stock,
                 is_active = excluded.is_active,
                 updated_at = excluded.updated_at",
        )
        .bind(&item.id.0)
        .bind(&item.name)
        .bind(&item.category)
        .bind(colors)
        .bind(elements)
        .bind(item.price.to_string())
        .bind(item.rating)
        .bind(i64::from(item.sold_count))
        .bind(i64::from(item.stock))
        .bind(bool_to_int(item.active))
        .bind(item.created_at.to_rfc3339())
        .bind(item.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_by_id(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM catalog_item WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn fetch_candidates(&self, query: &CandidateQuery) -> Result<Vec<Item>, RepositoryError> {
        let rows = match &query.category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM catalog_item
                     WHERE is_active = 1 AND stock > 0 AND category = ?"
                ))
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ITEM_COLUMNS} FROM catalog_item WHERE is_active = 1 AND stock > 0"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter().map(row_to_item).collect()
    }
}

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item, RepositoryError> {
    let decode = |error: sqlx::Error| RepositoryError::Decode(error.to_string());

    let id: String = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;
    let colors: String = row.try_get("colors").map_err(decode)?;
    let elements: String = row.try_get("elements").map_err(decode)?;
    let price: String = row.try_get("price").map_err(decode)?;
    let rating: f64 = row.try_get("rating").map_err(decode)?;
    let sold_count: i64 = row.try_get("sold_count").map_err(decode)?;
    let stock: i64 = row.try_get("stock").map_err(decode)?;
    let is_active: i64 = row.try_get("is_active").map_err(decode)?;
    let created_at: String = row.try_get("created_at").map_err(decode)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode)?;

    let price = Decimal::from_str(&price)
        .map_err(|error| RepositoryError::Decode(format!("price: {error}")))?;
    let sold_count = u32::try_from(sold_count)
        .map_err(|error| RepositoryError::Decode(format!("sold_count: {error}")))?;
    let stock =
        u32::try_from(stock).map_err(|error| RepositoryError::Decode(format!("stock: {error}")))?;

    Ok(Item {
        id: ItemId(id),
        name,
        category,
        colors: serde_json::from_str::<Vec<String>>(&colors)?,
        elements: serde_json::from_str::<Vec<Element>>(&elements)?,
        price,
        rating,
        sold_count,
        stock,
        active: is_active == 1,
        created_at: parse_timestamp("created_at", &created_at)?,
        updated_at: parse_timestamp("updated_at", &updated_at)?,
    })
}

#[async_trait]
impl CatalogStore for SqlCatalogRepository {
    async fn save(&self, item: Item) -> Result<(), StoreError> {
        validate_item(&item).map_err(StoreError::Invalid)?;
        Ok(self.upsert(&item).await?)
    }

    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.fetch_by_id(id).await?)
    }

    async fn rank_candidates(&self, query: &CandidateQuery) -> Result<Vec<Item>, StoreError> {
        Ok(self.fetch_candidates(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use fengshui_core::domain::element::Element;
    use fengshui_core::domain::item::{CandidateQuery, Item, ItemId};
    use fengshui_core::errors::StoreError;
    use fengshui_core::store::CatalogStore;

    use super::SqlCatalogRepository;
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlCatalogRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlCatalogRepository::new(pool)
    }

    fn item(id: &str, category: &str, stock: u32, active: bool) -> Item {
        Item {
            id: ItemId(id.to_string()),
            name: format!("Vòng tay {id}"),
            category: category.to_string(),
            colors: vec!["vàng".to_string(), "nâu".to_string()],
            elements: vec![Element::Earth, Element::Metal],
            price: Decimal::new(199_500, 2),
            rating: 4.5,
            sold_count: 120,
            stock,
            active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_find_preserves_every_field() {
        let repo = repository().await;
        let original = item("bracelet-1", "jewelry", 3, true);

        repo.save(original.clone()).await.expect("save");
        let found = repo.find_by_id(&original.id).await.expect("find").expect("item present");

        assert_eq!(found.price, Decimal::new(199_500, 2));
        assert_eq!(found.elements, vec![Element::Earth, Element::Metal]);
        assert_eq!(found.colors, original.colors);
        assert_eq!(found.sold_count, 120);
        assert!(found.active);
    }

    #[tokio::test]
    async fn candidates_exclude_inactive_and_out_of_stock_items() {
        let repo = repository().await;
        repo.save(item("a", "jewelry", 3, true)).await.expect("save");
        repo.save(item("b", "jewelry", 0, true)).await.expect("save");
        repo.save(item("c", "jewelry", 5, false)).await.expect("save");
        repo.save(item("d", "decor", 1, true)).await.expect("save");

        let mut all = repo
            .rank_candidates(&CandidateQuery::default())
            .await
            .expect("candidates")
            .into_iter()
            .map(|item| item.id.0)
            .collect::<Vec<_>>();
        all.sort();
        assert_eq!(all, vec!["a".to_string(), "d".to_string()]);

        let jewelry = repo
            .rank_candidates(&CandidateQuery { category: Some("jewelry".to_string()) })
            .await
            .expect("candidates");
        assert_eq!(jewelry.len(), 1);
        assert_eq!(jewelry[0].id.0, "a");
    }

    #[tokio::test]
    async fn save_refuses_invalid_items() {
        let repo = repository().await;
        let mut broken = item("bracelet-1", "jewelry", 3, true);
        broken.elements.clear();
        broken.price = Decimal::ZERO;

        let error = repo.save(broken.clone()).await.expect_err("invalid item");

        let StoreError::Invalid(errors) = error else {
            panic!("expected rejection, got {error}");
        };
        let fields =
            errors.violations().iter().map(|violation| violation.field.as_str()).collect::<Vec<_>>();
        assert_eq!(fields, vec!["elements", "price"]);
        assert!(repo.find_by_id(&broken.id).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn save_overwrites_existing_item() {
        let repo = repository().await;
        let mut bracelet = item("bracelet-1", "jewelry", 3, true);
        repo.save(bracelet.clone()).await.expect("save");

        bracelet.stock = 0;
        repo.save(bracelet.clone()).await.expect("update");

        let found = repo.find_by_id(&bracelet.id).await.expect("find").expect("item present");
        assert_eq!(found.stock, 0);
        assert!(repo.rank_candidates(&CandidateQuery::default()).await.expect("ranked").is_empty());
    }
}
