//! Catalog domain types: categories, subcategories, products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shopmate_core::{BusinessId, CategoryId, ProductId, SubcategoryId};

use super::business::BusinessSummary;

/// A top-level catalog category. Seeded at deployment, rarely mutated.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A second-level catalog category under exactly one [`Category`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A category with its subcategories and total product count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithSubcategories {
    #[serde(flatten)]
    pub category: Category,
    pub subcategories: Vec<Subcategory>,
    pub product_count: i64,
}

/// A subcategory with its product count.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryWithCount {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    pub product_count: i64,
}

/// A sellable product owned by exactly one business.
///
/// Invariants (enforced in SQL as CHECK constraints and revalidated at the
/// boundary): `price > 0`, `stock >= 0`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub business_id: BusinessId,
    pub category_id: CategoryId,
    pub subcategory_id: SubcategoryId,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with its taxonomy and owning business, as returned by
/// search, detail, and comparison endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
    pub subcategory: Subcategory,
    pub business: BusinessSummary,
}
