//! Order repository: joined reads and status updates.
//!
//! Order creation is not here - it is a multi-step invariant-preserving
//! transaction owned by [`crate::services::orders::OrderService`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use shopmate_core::{
    BusinessId, CategoryId, OrderId, OrderItemId, OrderStatus, ProductId, SubcategoryId, UserId,
};

use super::RepositoryError;
use crate::models::{Business, Order, OrderDetail, OrderItem, OrderItemDetail, PartySummary, Product};

/// Which order parties to embed in a joined read.
#[derive(Debug, Clone, Copy)]
struct PartyInclusion {
    buyer: bool,
    seller: bool,
}

const ORDER_DETAIL_SELECT: &str =
    "SELECT o.id, o.buyer_id, o.business_id, o.seller_id, o.total, o.status, o.created_at, \
     b.name AS business_name, b.description AS business_description, \
     b.address AS business_address, b.owner_contact AS business_owner_contact, \
     b.owner_id AS business_owner_id, b.logo_url AS business_logo_url, \
     b.created_at AS business_created_at, b.updated_at AS business_updated_at, \
     ub.name AS buyer_name, ub.email AS buyer_email, \
     us.name AS seller_name, us.email AS seller_email \
     FROM orders o \
     JOIN businesses b ON b.id = o.business_id \
     JOIN users ub ON ub.id = o.buyer_id \
     JOIN users us ON us.id = o.seller_id";

/// Internal row type for joined order reads.
#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    id: OrderId,
    buyer_id: UserId,
    business_id: BusinessId,
    seller_id: UserId,
    total: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    business_name: String,
    business_description: Option<String>,
    business_address: Option<String>,
    business_owner_contact: Option<String>,
    business_owner_id: UserId,
    business_logo_url: Option<String>,
    business_created_at: DateTime<Utc>,
    business_updated_at: DateTime<Utc>,
    buyer_name: String,
    buyer_email: String,
    seller_name: String,
    seller_email: String,
}

impl OrderDetailRow {
    fn into_detail(self, include: PartyInclusion, items: Vec<OrderItemDetail>) -> OrderDetail {
        let buyer = include.buyer.then(|| PartySummary {
            id: self.buyer_id,
            name: self.buyer_name.clone(),
            email: self.buyer_email.clone(),
        });
        let seller = include.seller.then(|| PartySummary {
            id: self.seller_id,
            name: self.seller_name.clone(),
            email: self.seller_email.clone(),
        });

        OrderDetail {
            order: Order {
                id: self.id,
                buyer_id: self.buyer_id,
                business_id: self.business_id,
                seller_id: self.seller_id,
                total: self.total,
                status: self.status,
                created_at: self.created_at,
            },
            business: Business {
                id: self.business_id,
                name: self.business_name,
                description: self.business_description,
                address: self.business_address,
                owner_contact: self.business_owner_contact,
                owner_id: self.business_owner_id,
                logo_url: self.business_logo_url,
                created_at: self.business_created_at,
                updated_at: self.business_updated_at,
            },
            order_items: items,
            buyer,
            seller,
        }
    }
}

/// Internal row type for line items joined with their product.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemDetailRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
    product_name: String,
    product_description: Option<String>,
    product_price: Decimal,
    product_stock: i32,
    product_business_id: BusinessId,
    product_category_id: CategoryId,
    product_subcategory_id: SubcategoryId,
    product_image_url: Option<String>,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl From<OrderItemDetailRow> for OrderItemDetail {
    fn from(row: OrderItemDetailRow) -> Self {
        Self {
            item: OrderItem {
                id: row.id,
                order_id: row.order_id,
                product_id: row.product_id,
                quantity: row.quantity,
                unit_price: row.unit_price,
            },
            product: Product {
                id: row.product_id,
                name: row.product_name,
                description: row.product_description,
                price: row.product_price,
                stock: row.product_stock,
                business_id: row.product_business_id,
                category_id: row.product_category_id,
                subcategory_id: row.product_subcategory_id,
                image_url: row.product_image_url,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a bare order by ID (no joins) for ownership and status checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, buyer_id, business_id, seller_id, total, status, created_at
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order with its business, items, and both party identities.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let row =
            sqlx::query_as::<_, OrderDetailRow>(&format!("{ORDER_DETAIL_SELECT} WHERE o.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut items = self.items_for_orders(&[row.id]).await?;
        let items = items.remove(&row.id).unwrap_or_default();

        Ok(Some(row.into_detail(
            PartyInclusion {
                buyer: true,
                seller: true,
            },
            items,
        )))
    }

    /// A buyer's orders, newest first, with business and items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_buyer(
        &self,
        buyer_id: UserId,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        self.list_where(
            "o.buyer_id",
            buyer_id,
            PartyInclusion {
                buyer: false,
                seller: false,
            },
        )
        .await
    }

    /// A seller's incoming orders, newest first, with buyer identity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: UserId,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        self.list_where(
            "o.seller_id",
            seller_id,
            PartyInclusion {
                buyer: true,
                seller: false,
            },
        )
        .await
    }

    /// Set an order's status. The caller is responsible for ownership and
    /// transition-legality checks.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $1
             WHERE id = $2
             RETURNING id, buyer_id, business_id, seller_id, total, status, created_at",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(order)
    }

    async fn list_where(
        &self,
        column: &str,
        user_id: UserId,
        include: PartyInclusion,
    ) -> Result<Vec<OrderDetail>, RepositoryError> {
        // `column` is one of two static strings chosen above; user input is
        // never interpolated here.
        let rows = sqlx::query_as::<_, OrderDetailRow>(&format!(
            "{ORDER_DETAIL_SELECT} WHERE {column} = $1 ORDER BY o.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items = self.items_for_orders(&order_ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                row.into_detail(include, order_items)
            })
            .collect())
    }

    /// Fetch the items (with products) for a set of orders, grouped by order.
    async fn items_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderItemDetail>>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let raw_ids: Vec<Uuid> = order_ids.iter().map(|id| id.as_uuid()).collect();

        let rows = sqlx::query_as::<_, OrderItemDetailRow>(
            "SELECT i.id, i.order_id, i.product_id, i.quantity, i.unit_price,
                    p.name AS product_name, p.description AS product_description,
                    p.price AS product_price, p.stock AS product_stock,
                    p.business_id AS product_business_id,
                    p.category_id AS product_category_id,
                    p.subcategory_id AS product_subcategory_id,
                    p.image_url AS product_image_url,
                    p.created_at AS product_created_at,
                    p.updated_at AS product_updated_at
             FROM order_items i
             JOIN products p ON p.id = i.product_id
             WHERE i.order_id = ANY($1)",
        )
        .bind(&raw_ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped: HashMap<OrderId, Vec<OrderItemDetail>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.order_id)
                .or_default()
                .push(OrderItemDetail::from(row));
        }

        Ok(grouped)
    }
}
