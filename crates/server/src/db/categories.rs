//! Category taxonomy repository (read-side; rows are seeded via the CLI).

use sqlx::PgPool;

use shopmate_core::{CategoryId, SubcategoryId};

use super::RepositoryError;
use crate::models::{Category, CategoryWithSubcategories, Subcategory, SubcategoryWithCount};

/// A category with per-subcategory product counts, as returned by the
/// subcategory listing endpoint.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<SubcategoryWithCount>,
}

/// Repository for catalog taxonomy reads.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all categories with their subcategories and total product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_subcategories(
        &self,
    ) -> Result<Vec<CategoryWithSubcategories>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct CategoryRow {
            #[sqlx(flatten)]
            category: Category,
            product_count: i64,
        }

        let categories = sqlx::query_as::<_, CategoryRow>(
            "SELECT c.id, c.name, c.slug,
                    (SELECT count(*) FROM products p WHERE p.category_id = c.id) AS product_count
             FROM categories c
             ORDER BY c.name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        let subcategories = sqlx::query_as::<_, Subcategory>(
            "SELECT id, category_id, name, slug FROM subcategories ORDER BY name ASC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories
            .into_iter()
            .map(|row| {
                let subcategories = subcategories
                    .iter()
                    .filter(|s| s.category_id == row.category.id)
                    .cloned()
                    .collect();
                CategoryWithSubcategories {
                    category: row.category,
                    subcategories,
                    product_count: row.product_count,
                }
            })
            .collect())
    }

    /// Get a category by slug with its subcategories and their product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CategoryDetail>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(category) = category else {
            return Ok(None);
        };

        let subcategories = self.subcategories_with_counts(category.id).await?;

        Ok(Some(CategoryDetail {
            category,
            subcategories,
        }))
    }

    /// Get a subcategory together with its parent category, for the price
    /// comparison header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_subcategory_with_category(
        &self,
        id: SubcategoryId,
    ) -> Result<Option<(Subcategory, Category)>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            subcategory: Subcategory,
            parent_name: String,
            parent_slug: String,
        }

        let row = sqlx::query_as::<_, Row>(
            "SELECT s.id, s.category_id, s.name, s.slug,
                    c.name AS parent_name, c.slug AS parent_slug
             FROM subcategories s
             JOIN categories c ON c.id = s.category_id
             WHERE s.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| {
            let category = Category {
                id: r.subcategory.category_id,
                name: r.parent_name,
                slug: r.parent_slug,
            };
            (r.subcategory, category)
        }))
    }

    async fn subcategories_with_counts(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<SubcategoryWithCount>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            subcategory: Subcategory,
            product_count: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT s.id, s.category_id, s.name, s.slug,
                    (SELECT count(*) FROM products p WHERE p.subcategory_id = s.id) AS product_count
             FROM subcategories s
             WHERE s.category_id = $1
             ORDER BY s.name ASC",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SubcategoryWithCount {
                subcategory: r.subcategory,
                product_count: r.product_count,
            })
            .collect())
    }
}
