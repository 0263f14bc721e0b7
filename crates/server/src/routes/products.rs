//! Product route handlers: seller-side CRUD plus the public search,
//! per-business listing, and cross-shop price comparison.

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopmate_core::{BusinessId, CategoryId, ProductId, SubcategoryId};

use crate::db::businesses::BusinessRepository;
use crate::db::categories::CategoryRepository;
use crate::db::products::{
    CreateProduct, ProductFilter, ProductRepository, SortKey, SortOrder, UpdateProduct,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::models::{BusinessSummary, Category, Product, ProductDetail, Subcategory, User};
use crate::response::{ApiResponse, Created};
use crate::routes::forms::ParsedForm;
use crate::services::UploadKind;
use crate::state::AppState;

/// Minimum product name length after trimming.
const MIN_NAME_LENGTH: usize = 2;

/// Query parameters for the public product search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchQuery {
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub search: Option<String>,
    pub sort_by: SortKey,
    pub order: SortOrder,
}

/// Query parameters for the price comparison.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub subcategory_id: Option<SubcategoryId>,
}

/// One business's offerings within a price comparison, cheapest first.
#[derive(Debug, Serialize)]
pub struct ComparisonGroup {
    pub business: BusinessSummary,
    pub products: Vec<ProductDetail>,
}

/// Price comparison payload: the subcategory under comparison, its parent
/// category, and per-business product groups.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub subcategory: Subcategory,
    pub category: Category,
    pub groups: Vec<ComparisonGroup>,
    pub total_products: usize,
}

/// List a product for sale. The caller must own the target business.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = ParsedForm::read(multipart, "image").await?;

    let name = form.required_text("name")?;
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Product name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    let price: Decimal = form.required_parsed("price")?;
    let stock: i32 = form.required_parsed("stock")?;
    validate_price_and_stock(Some(price), Some(stock))?;

    let business_id: BusinessId = form.required_parsed("businessId")?;
    let category_id: CategoryId = form.required_parsed("categoryId")?;
    let subcategory_id: SubcategoryId = form.required_parsed("subcategoryId")?;

    // A business that doesn't exist and one the caller doesn't own are the
    // same 403 to avoid leaking which business IDs exist.
    let owns = BusinessRepository::new(state.pool())
        .get(business_id)
        .await?
        .is_some_and(|b| b.owner_id == user.id);
    if !owns {
        return Err(AppError::Forbidden(
            "You do not own this business".to_owned(),
        ));
    }

    let image_url = match &form.file {
        Some(file) => Some(
            state
                .uploads()
                .save(UploadKind::ProductImage, file.file_name.as_deref(), &file.data)
                .await?,
        ),
        None => None,
    };

    let result = ProductRepository::new(state.pool())
        .create(CreateProduct {
            name,
            description: form.text("description"),
            price,
            stock,
            business_id,
            category_id,
            subcategory_id,
            image_url: image_url.clone(),
        })
        .await;

    match result {
        Ok(product) => Ok(Created(ApiResponse::data(product))),
        Err(e) => {
            if let Some(url) = &image_url {
                state.uploads().remove(url).await;
            }
            Err(e.into())
        }
    }
}

/// Public product search with filters and sorting.
#[instrument(skip_all)]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse> {
    if let (Some(min), Some(max)) = (query.min_price, query.max_price)
        && min > max
    {
        return Err(AppError::Validation(
            "minPrice must not exceed maxPrice".to_owned(),
        ));
    }

    let products = ProductRepository::new(state.pool())
        .search(&ProductFilter {
            category_id: query.category_id,
            subcategory_id: query.subcategory_id,
            min_price: query.min_price,
            max_price: query.max_price,
            search: query.search,
            sort_by: query.sort_by,
            order: query.order,
        })
        .await?;

    Ok(ApiResponse::data(products))
}

/// Cross-shop price comparison for one subcategory: products grouped by
/// business, cheapest first within each group.
#[instrument(skip_all)]
pub async fn compare(
    State(state): State<AppState>,
    Query(query): Query<CompareQuery>,
) -> Result<impl IntoResponse> {
    let subcategory_id = query.subcategory_id.ok_or_else(|| {
        AppError::Validation("subcategoryId query parameter is required".to_owned())
    })?;

    let (subcategory, category) = CategoryRepository::new(state.pool())
        .get_subcategory_with_category(subcategory_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subcategory not found".to_owned()))?;

    let products = ProductRepository::new(state.pool())
        .list_by_subcategory_price_asc(subcategory_id)
        .await?;

    let total_products = products.len();
    let groups = group_by_business(products);

    Ok(ApiResponse::data(Comparison {
        subcategory,
        category,
        groups,
        total_products,
    }))
}

/// Public list of one business's products.
#[instrument(skip_all, fields(business_id = %business_id))]
pub async fn list_by_business(
    State(state): State<AppState>,
    Path(business_id): Path<BusinessId>,
) -> Result<impl IntoResponse> {
    let products = ProductRepository::new(state.pool())
        .list_by_business(business_id)
        .await?;

    Ok(ApiResponse::data(products))
}

/// Public product detail with taxonomy and business.
#[instrument(skip_all, fields(product_id = %id))]
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let detail = ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(ApiResponse::data(detail))
}

/// Update a product. Only provided fields change; a new image replaces (and
/// deletes) the old file.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(state.pool());
    let existing = owned_product(&state, &repo, id, &user).await?;

    let form = ParsedForm::read(multipart, "image").await?;
    if let Some(name) = form.text("name")
        && name.chars().count() < MIN_NAME_LENGTH
    {
        return Err(AppError::Validation(format!(
            "Product name must be at least {MIN_NAME_LENGTH} characters"
        )));
    }
    let price: Option<Decimal> = form.parsed("price")?;
    let stock: Option<i32> = form.parsed("stock")?;
    validate_price_and_stock(price, stock)?;

    let new_image_url = match &form.file {
        Some(file) => Some(
            state
                .uploads()
                .save(UploadKind::ProductImage, file.file_name.as_deref(), &file.data)
                .await?,
        ),
        None => None,
    };

    let result = repo
        .update(
            id,
            UpdateProduct {
                name: form.text("name"),
                description: form.text("description"),
                price,
                stock,
                category_id: form.parsed("categoryId")?,
                subcategory_id: form.parsed("subcategoryId")?,
                image_url: new_image_url.clone(),
            },
        )
        .await;

    match result {
        Ok(product) => {
            if new_image_url.is_some()
                && let Some(old) = &existing.image_url
            {
                state.uploads().remove(old).await;
            }
            Ok(ApiResponse::data(product))
        }
        Err(e) => {
            if let Some(url) = &new_image_url {
                state.uploads().remove(url).await;
            }
            Err(e.into())
        }
    }
}

/// Delist a product. Refused with 409 while order history references it.
#[instrument(skip_all, fields(user_id = %user.id, product_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireSeller(user): RequireSeller,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(state.pool());
    let existing = owned_product(&state, &repo, id, &user).await?;

    repo.delete(id).await.map_err(|e| match e {
        crate::db::RepositoryError::Conflict(_) => AppError::Conflict(
            "Product appears in existing orders and cannot be deleted".to_owned(),
        ),
        other => other.into(),
    })?;

    if let Some(image) = &existing.image_url {
        state.uploads().remove(image).await;
    }

    Ok(ApiResponse::message("product deleted"))
}

/// Fetch a product and verify the caller owns its business.
async fn owned_product(
    state: &AppState,
    repo: &ProductRepository<'_>,
    id: ProductId,
    user: &User,
) -> Result<Product> {
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    let owns = BusinessRepository::new(state.pool())
        .get(product.business_id)
        .await?
        .is_some_and(|b| b.owner_id == user.id);
    if !owns {
        return Err(AppError::Forbidden(
            "You do not own this product".to_owned(),
        ));
    }

    Ok(product)
}

fn validate_price_and_stock(price: Option<Decimal>, stock: Option<i32>) -> Result<()> {
    if let Some(price) = price
        && price <= Decimal::ZERO
    {
        return Err(AppError::Validation("Price must be positive".to_owned()));
    }
    if let Some(stock) = stock
        && stock < 0
    {
        return Err(AppError::Validation(
            "Stock must be zero or positive".to_owned(),
        ));
    }
    Ok(())
}

/// Group an ascending-by-price product list by owning business. Groups keep
/// first-seen order (so the business with the cheapest product leads) and
/// each group inherits the ascending price order of the input.
fn group_by_business(products: Vec<ProductDetail>) -> Vec<ComparisonGroup> {
    let mut groups: Vec<ComparisonGroup> = Vec::new();

    for product in products {
        match groups
            .iter_mut()
            .find(|g| g.business.id == product.business.id)
        {
            Some(group) => group.products.push(product),
            None => groups.push(ComparisonGroup {
                business: product.business.clone(),
                products: vec![product],
            }),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn detail(business_id: BusinessId, business_name: &str, price: Decimal) -> ProductDetail {
        let category = Category {
            id: CategoryId::generate(),
            name: "Electronics".to_owned(),
            slug: "electronics".to_owned(),
        };
        let subcategory = Subcategory {
            id: SubcategoryId::generate(),
            category_id: category.id,
            name: "Lamps".to_owned(),
            slug: "lamps".to_owned(),
        };
        ProductDetail {
            product: Product {
                id: ProductId::generate(),
                name: "Lamp".to_owned(),
                description: None,
                price,
                stock: 1,
                business_id,
                category_id: category.id,
                subcategory_id: subcategory.id,
                image_url: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            category,
            subcategory,
            business: BusinessSummary {
                id: business_id,
                name: business_name.to_owned(),
                address: None,
            },
        }
    }

    #[test]
    fn groups_strictly_by_business_id() {
        let a = BusinessId::generate();
        let b = BusinessId::generate();

        // Input already ascending by price, interleaved across businesses.
        let groups = group_by_business(vec![
            detail(a, "Alpha", dec!(1.00)),
            detail(b, "Beta", dec!(2.00)),
            detail(a, "Alpha", dec!(3.00)),
            detail(b, "Beta", dec!(4.00)),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].business.id, a);
        assert_eq!(groups[1].business.id, b);
        assert_eq!(groups[0].products.len(), 2);
        assert_eq!(groups[1].products.len(), 2);
    }

    #[test]
    fn groups_preserve_ascending_price() {
        let a = BusinessId::generate();
        let groups = group_by_business(vec![
            detail(a, "Alpha", dec!(1.00)),
            detail(a, "Alpha", dec!(2.50)),
            detail(a, "Alpha", dec!(9.99)),
        ]);

        let prices: Vec<Decimal> = groups[0].products.iter().map(|p| p.product.price).collect();
        assert_eq!(prices, vec![dec!(1.00), dec!(2.50), dec!(9.99)]);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_by_business(Vec::new()).is_empty());
    }

    #[test]
    fn price_and_stock_bounds() {
        assert!(validate_price_and_stock(Some(dec!(0.01)), Some(0)).is_ok());
        assert!(validate_price_and_stock(Some(Decimal::ZERO), None).is_err());
        assert!(validate_price_and_stock(None, Some(-1)).is_err());
        assert!(validate_price_and_stock(None, None).is_ok());
    }
}
