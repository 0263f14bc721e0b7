//! Product repository: CRUD plus the public search and comparison reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use shopmate_core::{BusinessId, CategoryId, ProductId, SubcategoryId};

use super::RepositoryError;
use crate::models::{BusinessSummary, Category, Product, ProductDetail, Subcategory};

/// Fields for creating a product.
#[derive(Debug)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub business_id: BusinessId,
    pub category_id: CategoryId,
    pub subcategory_id: SubcategoryId,
    pub image_url: Option<String>,
}

/// Partial update for a product. `None` fields are left unchanged.
#[derive(Debug, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub image_url: Option<String>,
}

/// Sort key accepted by the public product search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Price,
    #[default]
    CreatedAt,
    Name,
}

impl SortKey {
    /// The column this key sorts by. Static strings only; never interpolate
    /// user input into ORDER BY.
    const fn column(self) -> &'static str {
        match self {
            Self::Price => "p.price",
            Self::CreatedAt => "p.created_at",
            Self::Name => "p.name",
        }
    }
}

/// Sort direction accepted by the public product search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filter predicates for the public product search. All fields are optional
/// and combine conjunctively; the price range is inclusive on both ends and
/// the text search is a case-insensitive substring match on name OR
/// description.
#[derive(Debug, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, business_id, category_id, \
                               subcategory_id, image_url, created_at, updated_at";

/// SELECT list and joins shared by every read that returns [`ProductDetail`].
const DETAIL_SELECT: &str = "SELECT p.id, p.name, p.description, p.price, p.stock, \
                             p.business_id, p.category_id, p.subcategory_id, p.image_url, \
                             p.created_at, p.updated_at, \
                             c.name AS category_name, c.slug AS category_slug, \
                             s.name AS subcategory_name, s.slug AS subcategory_slug, \
                             b.name AS business_name, b.address AS business_address \
                             FROM products p \
                             JOIN categories c ON c.id = p.category_id \
                             JOIN subcategories s ON s.id = p.subcategory_id \
                             JOIN businesses b ON b.id = p.business_id";

/// Internal row type for joined product reads.
#[derive(Debug, sqlx::FromRow)]
struct ProductDetailRow {
    id: ProductId,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    business_id: BusinessId,
    category_id: CategoryId,
    subcategory_id: SubcategoryId,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: String,
    category_slug: String,
    subcategory_name: String,
    subcategory_slug: String,
    business_name: String,
    business_address: Option<String>,
}

impl From<ProductDetailRow> for ProductDetail {
    fn from(row: ProductDetailRow) -> Self {
        Self {
            product: Product {
                id: row.id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                business_id: row.business_id,
                category_id: row.category_id,
                subcategory_id: row.subcategory_id,
                image_url: row.image_url,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            category: Category {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
            subcategory: Subcategory {
                id: row.subcategory_id,
                category_id: row.category_id,
                name: row.subcategory_name,
                slug: row.subcategory_slug,
            },
            business: BusinessSummary {
                id: row.business_id,
                name: row.business_name,
                address: row.business_address,
            },
        }
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// CHECK violations on price/stock, which the boundary should have
    /// rejected already).
    pub async fn create(&self, input: CreateProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products
                 (name, description, price, stock, business_id, category_id, subcategory_id, image_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .bind(input.business_id)
        .bind(input.category_id)
        .bind(input.subcategory_id)
        .bind(&input.image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product joined with its taxonomy and owning business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductDetailRow>(&format!("{DETAIL_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(ProductDetail::from))
    }

    /// List all products of one business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_business(
        &self,
        business_id: BusinessId,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE p.business_id = $1 ORDER BY p.created_at DESC"
        ))
        .bind(business_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductDetail::from).collect())
    }

    /// Search products with the public filter predicates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(DETAIL_SELECT);
        query.push(" WHERE TRUE");

        if let Some(category_id) = filter.category_id {
            query.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(subcategory_id) = filter.subcategory_id {
            query
                .push(" AND p.subcategory_id = ")
                .push_bind(subcategory_id);
        }
        if let Some(min_price) = filter.min_price {
            query.push(" AND p.price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND p.price <= ").push_bind(max_price);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            query
                .push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        query
            .push(" ORDER BY ")
            .push(filter.sort_by.column())
            .push(" ")
            .push(filter.order.keyword());

        let rows = query
            .build_query_as::<ProductDetailRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ProductDetail::from).collect())
    }

    /// All products in a subcategory, cheapest first. Feeds the cross-shop
    /// price comparison, which groups these by business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_subcategory_price_asc(
        &self,
        subcategory_id: SubcategoryId,
    ) -> Result<Vec<ProductDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductDetailRow>(&format!(
            "{DETAIL_SELECT} WHERE p.subcategory_id = $1 ORDER BY p.price ASC"
        ))
        .bind(subcategory_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductDetail::from).collect())
    }

    /// Apply a partial update to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: UpdateProduct,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET
                 name = COALESCE($1, name),
                 description = COALESCE($2, description),
                 price = COALESCE($3, price),
                 stock = COALESCE($4, stock),
                 category_id = COALESCE($5, category_id),
                 subcategory_id = COALESCE($6, subcategory_id),
                 image_url = COALESCE($7, image_url),
                 updated_at = now()
             WHERE id = $8
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(changes.category_id)
        .bind(changes.subcategory_id)
        .bind(&changes.image_url)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(product)
    }

    /// Delete a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if order items still reference it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by existing orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Escape LIKE metacharacters so a user searching for "100%" matches
/// literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_sort_key_columns_are_static() {
        assert_eq!(SortKey::Price.column(), "p.price");
        assert_eq!(SortKey::CreatedAt.column(), "p.created_at");
        assert_eq!(SortKey::Name.column(), "p.name");
        assert_eq!(SortOrder::Asc.keyword(), "ASC");
        assert_eq!(SortOrder::Desc.keyword(), "DESC");
    }

    #[test]
    fn test_sort_key_wire_names() {
        let key: SortKey = serde_json::from_str("\"createdAt\"").expect("deserialize");
        assert_eq!(key, SortKey::CreatedAt);
        let key: SortKey = serde_json::from_str("\"price\"").expect("deserialize");
        assert_eq!(key, SortKey::Price);
        let order: SortOrder = serde_json::from_str("\"asc\"").expect("deserialize");
        assert_eq!(order, SortOrder::Asc);
        assert!(serde_json::from_str::<SortKey>("\"id\"").is_err());
    }
}
