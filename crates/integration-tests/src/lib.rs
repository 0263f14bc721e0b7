//! Integration tests for the Shopmate marketplace API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database and run migrations + taxonomy seed
//! cargo run -p shopmate-cli -- migrate
//! cargo run -p shopmate-cli -- seed taxonomy
//!
//! # Start the server
//! cargo run -p shopmate-server
//!
//! # Run the tests (they are #[ignore]d by default)
//! cargo test -p shopmate-integration-tests -- --ignored
//! ```
//!
//! Every test provisions its own users with unique emails, so suites can be
//! re-run against the same database without cleanup.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API server (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("SHOPMATE_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// A client with a cookie store, so auth cookies persist across calls.
///
/// # Panics
///
/// Panics if the client cannot be constructed.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh unique email so tests never collide across runs.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4())
}

/// Sign up a new user; the client's cookie store receives the auth cookies.
///
/// # Panics
///
/// Panics if the request fails or the API rejects the signup.
pub async fn signup(client: &Client, email: &str, name: &str) -> Value {
    let resp = client
        .post(format!("{}/api/auth/signup", base_url()))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "name": name,
        }))
        .send()
        .await
        .expect("signup request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED, "signup should succeed");
    resp.json::<Value>().await.expect("signup response not JSON")
}

/// Sign up a fresh user and pick a role. Returns the user object.
///
/// # Panics
///
/// Panics if any step fails.
pub async fn signup_with_role(client: &Client, role: &str) -> Value {
    let email = unique_email(&role.to_lowercase());
    signup(client, &email, "Test User").await;

    let resp = client
        .post(format!("{}/api/auth/choose-role", base_url()))
        .json(&json!({"role": role}))
        .send()
        .await
        .expect("choose-role request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    resp.json::<Value>()
        .await
        .expect("choose-role response not JSON")["data"]
        .clone()
}

/// Create a business for an authenticated seller client. Returns the
/// business object.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn create_business(client: &Client, name: &str) -> Value {
    let form = reqwest::multipart::Form::new()
        .text("name", name.to_owned())
        .text("address", "1 Market St");

    let resp = client
        .post(format!("{}/api/business", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("create business request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    resp.json::<Value>()
        .await
        .expect("business response not JSON")["data"]
        .clone()
}

/// Fetch the seeded taxonomy and return (`category_id`, `subcategory_id`)
/// of the first category and its first subcategory.
///
/// # Panics
///
/// Panics if the taxonomy is empty (run `shopmate-cli seed taxonomy`).
pub async fn first_taxonomy_ids(client: &Client) -> (String, String) {
    let resp = client
        .get(format!("{}/api/categories", base_url()))
        .send()
        .await
        .expect("categories request failed");

    let body = resp.json::<Value>().await.expect("categories not JSON");
    let category = &body["data"][0];
    let category_id = category["id"].as_str().expect("category id").to_owned();
    let subcategory_id = category["subcategories"][0]["id"]
        .as_str()
        .expect("subcategory id (did you seed the taxonomy?)")
        .to_owned();

    (category_id, subcategory_id)
}

/// List a product under a seller's business. Returns the product object.
///
/// # Panics
///
/// Panics if the request fails.
pub async fn create_product(
    client: &Client,
    business_id: &str,
    category_id: &str,
    subcategory_id: &str,
    name: &str,
    price: &str,
    stock: i32,
) -> Value {
    let form = reqwest::multipart::Form::new()
        .text("name", name.to_owned())
        .text("price", price.to_owned())
        .text("stock", stock.to_string())
        .text("businessId", business_id.to_owned())
        .text("categoryId", category_id.to_owned())
        .text("subcategoryId", subcategory_id.to_owned());

    let resp = client
        .post(format!("{}/api/products", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("create product request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);
    resp.json::<Value>()
        .await
        .expect("product response not JSON")["data"]
        .clone()
}
