//! Business repository for database operations.

use sqlx::PgPool;

use shopmate_core::{BusinessId, UserId};

use super::RepositoryError;
use crate::models::{Business, BusinessDetail, BusinessWithCounts, Product};

/// Fields for creating a business. The logo URL is assigned by the upload
/// store before the row is inserted.
#[derive(Debug)]
pub struct CreateBusiness {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub owner_contact: Option<String>,
    pub owner_id: UserId,
    pub logo_url: Option<String>,
}

/// Partial update for a business. `None` fields are left unchanged;
/// `logo_url` is applied only when a new logo was uploaded.
#[derive(Debug, Default)]
pub struct UpdateBusiness {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub owner_contact: Option<String>,
    pub logo_url: Option<String>,
}

const BUSINESS_COLUMNS: &str =
    "id, name, description, address, owner_contact, owner_id, logo_url, created_at, updated_at";

/// Repository for business database operations.
pub struct BusinessRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BusinessRepository<'a> {
    /// Create a new business repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: CreateBusiness) -> Result<Business, RepositoryError> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "INSERT INTO businesses (name, description, address, owner_contact, owner_id, logo_url)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {BUSINESS_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.address)
        .bind(&input.owner_contact)
        .bind(input.owner_id)
        .bind(&input.logo_url)
        .fetch_one(self.pool)
        .await?;

        Ok(business)
    }

    /// Get a business by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BusinessId) -> Result<Option<Business>, RepositoryError> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(business)
    }

    /// List all businesses owned by a user, with product and order counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(
        &self,
        owner_id: UserId,
    ) -> Result<Vec<BusinessWithCounts>, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct Row {
            #[sqlx(flatten)]
            business: Business,
            product_count: i64,
            order_count: i64,
        }

        let rows = sqlx::query_as::<_, Row>(
            "SELECT b.id, b.name, b.description, b.address, b.owner_contact, b.owner_id,
                    b.logo_url, b.created_at, b.updated_at,
                    (SELECT count(*) FROM products p WHERE p.business_id = b.id) AS product_count,
                    (SELECT count(*) FROM orders o WHERE o.business_id = b.id) AS order_count
             FROM businesses b
             WHERE b.owner_id = $1
             ORDER BY b.created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| BusinessWithCounts {
                business: r.business,
                product_count: r.product_count,
                order_count: r.order_count,
            })
            .collect())
    }

    /// Get a business with its products and order count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        id: BusinessId,
    ) -> Result<Option<BusinessDetail>, RepositoryError> {
        let Some(business) = self.get(id).await? else {
            return Ok(None);
        };

        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, stock, business_id, category_id,
                    subcategory_id, image_url, created_at, updated_at
             FROM products
             WHERE business_id = $1
             ORDER BY created_at DESC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let order_count =
            sqlx::query_scalar::<_, i64>("SELECT count(*) FROM orders WHERE business_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(Some(BusinessDetail {
            business,
            products,
            order_count,
        }))
    }

    /// Apply a partial update to a business.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the business doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: BusinessId,
        changes: UpdateBusiness,
    ) -> Result<Business, RepositoryError> {
        let business = sqlx::query_as::<_, Business>(&format!(
            "UPDATE businesses SET
                 name = COALESCE($1, name),
                 description = COALESCE($2, description),
                 address = COALESCE($3, address),
                 owner_contact = COALESCE($4, owner_contact),
                 logo_url = COALESCE($5, logo_url),
                 updated_at = now()
             WHERE id = $6
             RETURNING {BUSINESS_COLUMNS}"
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.address)
        .bind(&changes.owner_contact)
        .bind(&changes.logo_url)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(business)
    }

    /// Count the products listed under a business.
    ///
    /// Used to enforce the delete-restriction: a business with products
    /// cannot be deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_count(&self, id: BusinessId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT count(*) FROM products WHERE business_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(count)
    }

    /// Delete a business by ID.
    ///
    /// The FK from products and orders is `ON DELETE RESTRICT`, so this maps
    /// a foreign-key violation to `Conflict` as a second line of defense
    /// behind [`Self::product_count`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the business doesn't exist.
    /// Returns `RepositoryError::Conflict` if dependent rows still reference it.
    pub async fn delete(&self, id: BusinessId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "business still has products or orders".to_owned(),
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
