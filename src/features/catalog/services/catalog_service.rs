use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::StoreError;
use crate::features::catalog::models::{Category, CategoryProfile, SubCategory, Subject};

/// Read-only catalog of report categories and subjects
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn sub_categories(&self) -> Result<Vec<SubCategory>, StoreError>;

    /// Subjects, optionally limited to one grade level
    async fn subjects(&self, grade_level_id: Option<i64>) -> Result<Vec<Subject>, StoreError>;

    /// Subjects by id, in the order the ids were given; unknown ids are skipped
    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError>;

    async fn category_profile(
        &self,
        category_id: i64,
        sub_category_id: Option<i64>,
    ) -> Result<CategoryProfile, StoreError>;
}

/// Postgres-backed catalog
pub struct CatalogService {
    pool: PgPool,
}

impl CatalogService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn category_by_id(&self, id: i64) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, report_kind FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get category: {:?}", e);
            StoreError::Database(e)
        })?
        .ok_or_else(|| StoreError::NotFound(format!("Category {} not found", id)))
    }

    async fn sub_category_by_id(&self, id: i64) -> Result<SubCategory, StoreError> {
        sqlx::query_as::<_, SubCategory>(
            "SELECT id, category_id, name, report_kind FROM sub_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get sub-category: {:?}", e);
            StoreError::Database(e)
        })?
        .ok_or_else(|| StoreError::NotFound(format!("Sub-category {} not found", id)))
    }
}

#[async_trait]
impl Catalog for CatalogService {
    async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        sqlx::query_as::<_, Category>("SELECT id, name, report_kind FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list categories: {:?}", e);
                StoreError::Database(e)
            })
    }

    async fn sub_categories(&self) -> Result<Vec<SubCategory>, StoreError> {
        sqlx::query_as::<_, SubCategory>(
            "SELECT id, category_id, name, report_kind FROM sub_categories ORDER BY category_id, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list sub-categories: {:?}", e);
            StoreError::Database(e)
        })
    }

    async fn subjects(&self, grade_level_id: Option<i64>) -> Result<Vec<Subject>, StoreError> {
        sqlx::query_as::<_, Subject>(
            r#"
            SELECT id, name, grade_level_id
            FROM subjects
            WHERE ($1::BIGINT IS NULL OR grade_level_id = $1 OR grade_level_id IS NULL)
            ORDER BY name, id
            "#,
        )
        .bind(grade_level_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list subjects: {:?}", e);
            StoreError::Database(e)
        })
    }

    async fn subjects_by_ids(&self, ids: &[i64]) -> Result<Vec<Subject>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, Subject>(
            "SELECT id, name, grade_level_id FROM subjects WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get subjects: {:?}", e);
            StoreError::Database(e)
        })?;

        Ok(ids
            .iter()
            .filter_map(|id| rows.iter().find(|s| s.id == *id).cloned())
            .collect())
    }

    async fn category_profile(
        &self,
        category_id: i64,
        sub_category_id: Option<i64>,
    ) -> Result<CategoryProfile, StoreError> {
        let category = self.category_by_id(category_id).await?;

        let sub_category = match sub_category_id {
            Some(id) => {
                let sub = self.sub_category_by_id(id).await?;
                if sub.category_id != category.id {
                    return Err(StoreError::NotFound(format!(
                        "Sub-category {} does not belong to category {}",
                        id, category.id
                    )));
                }
                Some(sub)
            }
            None => None,
        };

        Ok(CategoryProfile::from_rows(&category, sub_category.as_ref()))
    }
}
