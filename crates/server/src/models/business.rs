//! Business (storefront) domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use shopmate_core::{BusinessId, UserId};

use super::catalog::Product;

/// A seller-owned storefront grouping products and receiving orders.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub owner_contact: Option<String>,
    pub owner_id: UserId,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A business with aggregate counts, as listed on the seller dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessWithCounts {
    #[serde(flatten)]
    pub business: Business,
    pub product_count: i64,
    pub order_count: i64,
}

/// A business with its full product list, as shown on the detail page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetail {
    #[serde(flatten)]
    pub business: Business,
    pub products: Vec<Product>,
    pub order_count: i64,
}

/// Minimal identity of a business embedded in product and order responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    pub id: BusinessId,
    pub name: String,
    pub address: Option<String>,
}
