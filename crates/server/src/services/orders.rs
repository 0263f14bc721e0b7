//! Order placement engine.
//!
//! Placing an order is the one multi-table invariant in the system: stock
//! must never go negative and an order must never reference a product from
//! another business. Everything here runs inside a single database
//! transaction with the business and all referenced products row-locked, so
//! two concurrent buyers cannot both take the last unit.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use shopmate_core::{BusinessId, OrderId, ProductId, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::OrderDetail;

/// One requested line of a new order, as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Errors that can occur while placing or updating an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The target business does not exist.
    #[error("Business not found")]
    BusinessNotFound,

    /// A line references a product that doesn't exist or belongs to a
    /// different business.
    #[error("Invalid product in order: {0}")]
    InvalidProduct(ProductId),

    /// Requested quantity exceeds available stock.
    #[error("Insufficient stock for product: {product}")]
    InsufficientStock { product: String },

    /// The order has no lines.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line's quantity is zero or negative.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i32),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// A product row locked `FOR UPDATE` for the duration of the transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
struct LockedProduct {
    id: ProductId,
    name: String,
    price: Decimal,
    stock: i32,
    business_id: BusinessId,
}

/// A validated order line with its price captured from the locked row.
#[derive(Debug, PartialEq, Eq)]
struct PricedLine {
    product_id: ProductId,
    quantity: i32,
    unit_price: Decimal,
}

impl PricedLine {
    fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Order placement service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order against one business, atomically.
    ///
    /// Inside a single transaction: the business row and every referenced
    /// product row are locked (products in ascending ID order, so concurrent
    /// orders over overlapping products cannot deadlock), every line is
    /// validated against the locked state, prices are captured, the order
    /// and its items are inserted, and stock is decremented. Either the
    /// whole order lands or nothing does.
    ///
    /// # Errors
    ///
    /// Returns a domain error for empty orders, bad quantities, missing or
    /// foreign products, unknown businesses, and insufficient stock.
    pub async fn create_order(
        &self,
        buyer_id: UserId,
        business_id: BusinessId,
        lines: &[OrderLine],
    ) -> Result<OrderDetail, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        if let Some(bad) = lines.iter().find(|l| l.quantity <= 0) {
            return Err(OrderError::InvalidQuantity(bad.quantity));
        }

        let mut tx = self.pool.begin().await?;

        // Lock the business so it cannot be deleted mid-order.
        let seller_id = sqlx::query_scalar::<_, UserId>(
            "SELECT owner_id FROM businesses WHERE id = $1 FOR UPDATE",
        )
        .bind(business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::BusinessNotFound)?;

        // Lock all referenced products in ascending ID order.
        let mut product_ids: Vec<uuid::Uuid> =
            lines.iter().map(|l| l.product_id.as_uuid()).collect();
        product_ids.sort_unstable();
        product_ids.dedup();

        let products = sqlx::query_as::<_, LockedProduct>(
            "SELECT id, name, price, stock, business_id
             FROM products WHERE id = ANY($1)
             ORDER BY id
             FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let priced = price_lines(&products, lines, business_id)?;
        let total = order_total(&priced);

        let order_id = sqlx::query_scalar::<_, OrderId>(
            "INSERT INTO orders (buyer_id, business_id, seller_id, total)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(buyer_id)
        .bind(business_id)
        .bind(seller_id)
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for line in &priced {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE products SET stock = stock - $1, updated_at = now() WHERE id = $2",
            )
            .bind(line.quantity)
            .bind(line.product_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let detail = OrderRepository::new(self.pool)
            .get_detail(order_id)
            .await?
            .ok_or(OrderError::Repository(RepositoryError::NotFound))?;

        Ok(detail)
    }
}

/// Validate every line against the locked products and capture unit prices.
///
/// Quantities for the same product across lines are summed before the stock
/// check, so an order cannot sneak past it by splitting a product over
/// multiple lines.
fn price_lines(
    products: &[LockedProduct],
    lines: &[OrderLine],
    business_id: BusinessId,
) -> Result<Vec<PricedLine>, OrderError> {
    let mut priced = Vec::with_capacity(lines.len());

    for line in lines {
        let product = products
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(OrderError::InvalidProduct(line.product_id))?;

        if product.business_id != business_id {
            return Err(OrderError::InvalidProduct(line.product_id));
        }

        let already_requested: i64 = lines
            .iter()
            .filter(|l| l.product_id == product.id)
            .map(|l| i64::from(l.quantity))
            .sum();

        if already_requested > i64::from(product.stock) {
            return Err(OrderError::InsufficientStock {
                product: product.name.clone(),
            });
        }

        priced.push(PricedLine {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price: product.price,
        });
    }

    Ok(priced)
}

/// The order total is the sum of captured unit price times quantity.
fn order_total(lines: &[PricedLine]) -> Decimal {
    lines.iter().map(PricedLine::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(price: Decimal, stock: i32, business_id: BusinessId) -> LockedProduct {
        LockedProduct {
            id: ProductId::generate(),
            name: "Test Product".into(),
            price,
            stock,
            business_id,
        }
    }

    fn line(product: &LockedProduct, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: product.id,
            quantity,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let business = BusinessId::generate();
        let lamp = product(dec!(19.99), 10, business);
        let desk = product(dec!(120.00), 3, business);

        let priced = price_lines(
            &[lamp.clone(), desk.clone()],
            &[line(&lamp, 2), line(&desk, 1)],
            business,
        )
        .unwrap();

        assert_eq!(order_total(&priced), dec!(159.98));
    }

    #[test]
    fn unit_price_is_captured_from_locked_row() {
        let business = BusinessId::generate();
        let lamp = product(dec!(5.50), 10, business);

        let priced = price_lines(&[lamp.clone()], &[line(&lamp, 3)], business).unwrap();

        assert_eq!(priced[0].unit_price, dec!(5.50));
        assert_eq!(priced[0].line_total(), dec!(16.50));
    }

    #[test]
    fn unknown_product_is_invalid() {
        let business = BusinessId::generate();
        let lamp = product(dec!(5.50), 10, business);
        let ghost = OrderLine {
            product_id: ProductId::generate(),
            quantity: 1,
        };

        let err = price_lines(&[lamp], &[ghost], business).unwrap_err();
        assert!(matches!(err, OrderError::InvalidProduct(_)));
    }

    #[test]
    fn product_from_another_business_is_invalid() {
        let target = BusinessId::generate();
        let other = BusinessId::generate();
        let foreign = product(dec!(5.50), 10, other);
        let request = line(&foreign, 1);

        let err = price_lines(&[foreign], &[request], target).unwrap_err();
        assert!(matches!(err, OrderError::InvalidProduct(_)));
    }

    #[test]
    fn stock_check_counts_whole_order() {
        let business = BusinessId::generate();
        let lamp = product(dec!(5.50), 5, business);

        // 3 + 3 exceeds the 5 in stock even though each line alone fits.
        let err = price_lines(
            &[lamp.clone()],
            &[line(&lamp, 3), line(&lamp, 3)],
            business,
        )
        .unwrap_err();

        assert!(matches!(err, OrderError::InsufficientStock { .. }));
    }

    #[test]
    fn exact_stock_is_allowed() {
        let business = BusinessId::generate();
        let lamp = product(dec!(5.50), 5, business);

        assert!(price_lines(&[lamp.clone()], &[line(&lamp, 5)], business).is_ok());
    }
}
