//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /healthcheck                          - Health check
//! GET  /uploads/*                            - Uploaded images (static)
//!
//! # Auth
//! POST /api/auth/signup                      - Register (sets auth cookies)
//! POST /api/auth/login                       - Login (sets auth cookies)
//! POST /api/auth/refresh                     - Rotate the access cookie
//! POST /api/auth/logout                      - Clear auth cookies
//! POST /api/auth/choose-role                 - Pick BUYER or SELLER
//! GET  /api/auth/me                          - Current user
//!
//! # Businesses
//! POST   /api/business                       - Register a business (seller)
//! GET    /api/business                       - Own businesses with counts (seller)
//! GET    /api/business/{id}                  - Business detail (authenticated)
//! PUT    /api/business/{id}                  - Update (seller + owner)
//! DELETE /api/business/{id}                  - Delete, 409 while products remain
//!
//! # Catalog (public reads)
//! GET  /api/categories                       - Categories with subcategories
//! GET  /api/categories/{slug}/subcategories  - One category's subcategories
//! GET  /api/products                         - Search with filters and sorting
//! GET  /api/products/compare?subcategoryId=  - Cross-shop price comparison
//! GET  /api/products/business/{businessId}   - One business's products
//! GET  /api/products/{id}                    - Product detail
//!
//! # Products (seller writes)
//! POST   /api/products                       - List a product
//! PUT    /api/products/{id}                  - Update (seller + owner)
//! DELETE /api/products/{id}                  - Delist, 409 if ordered
//!
//! # Orders
//! POST /api/orders                           - Place an order (buyer)
//! GET  /api/orders                           - Own orders as buyer
//! GET  /api/orders/seller/orders             - Incoming orders (seller)
//! GET  /api/orders/{id}                      - Order detail (buyer or seller party)
//! PUT  /api/orders/{id}/status               - Advance status (seller)
//! ```

pub mod auth;
pub mod businesses;
pub mod categories;
mod forms;
pub mod orders;
pub mod products;

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/choose-role", post(auth::choose_role))
        .route("/me", get(auth::me));

    let business = Router::new()
        .route("/", post(businesses::create).get(businesses::list))
        .route(
            "/{id}",
            get(businesses::get)
                .put(businesses::update)
                .delete(businesses::delete),
        );

    let catalog = Router::new()
        .route("/", get(categories::list))
        .route("/{slug}/subcategories", get(categories::subcategories));

    let product = Router::new()
        .route("/", post(products::create).get(products::search))
        .route("/compare", get(products::compare))
        .route("/business/{businessId}", get(products::list_by_business))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        );

    let order = Router::new()
        .route("/", post(orders::create).get(orders::list))
        .route("/seller/orders", get(orders::list_for_seller))
        .route("/{id}", get(orders::get))
        .route("/{id}/status", put(orders::update_status));

    Router::new()
        .route("/healthcheck", get(healthcheck))
        .nest("/api/auth", auth)
        .nest("/api/business", business)
        .nest("/api/categories", catalog)
        .nest("/api/products", product)
        .nest("/api/orders", order)
        .nest_service("/uploads", ServeDir::new(state.uploads().root()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    uptime_secs: u64,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// Liveness health check endpoint.
async fn healthcheck(State(state): State<AppState>) -> impl IntoResponse {
    ApiResponse::data(Health {
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now(),
    })
}
