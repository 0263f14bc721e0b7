//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use shopmate_core::{BusinessId, OrderId, OrderItemId, OrderStatus, ProductId, UserId};

use super::business::Business;
use super::catalog::Product;
use super::user::PartySummary;

/// An order placed by a buyer against one business's catalog.
///
/// `seller_id` is a snapshot of `business.owner_id` taken at creation time,
/// not a live reference; `total` is the sum of the line totals computed from
/// the prices read inside the creation transaction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub business_id: BusinessId,
    pub seller_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// A line item within an order.
///
/// `unit_price` is the product price captured at order time, so historical
/// orders stay accurate when the live product price changes later.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A line item joined with its product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Product,
}

/// An order joined with its business, line items, and (where the endpoint
/// exposes them) the identities of the two parties.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub business: Business,
    pub order_items: Vec<OrderItemDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<PartySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller: Option<PartySummary>,
}
