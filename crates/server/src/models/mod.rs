//! Domain models for the marketplace.
//!
//! These types represent validated domain objects separate from database row
//! types. They serialize to the camelCase JSON the API exposes; nothing in
//! this module ever carries a password hash.

pub mod business;
pub mod catalog;
pub mod order;
pub mod user;

pub use business::{Business, BusinessDetail, BusinessSummary, BusinessWithCounts};
pub use catalog::{
    Category, CategoryWithSubcategories, Product, ProductDetail, Subcategory,
    SubcategoryWithCount,
};
pub use order::{Order, OrderDetail, OrderItem, OrderItemDetail};
pub use user::{PartySummary, User};
