//! Catalog tests: search filters, sorting, and cross-shop comparison.

use serde_json::Value;
use shopmate_integration_tests::{
    base_url, client, create_business, create_product, first_taxonomy_ids, signup_with_role,
};

async fn seller_with_catalog(names_prices: &[(&str, &str)]) -> (reqwest::Client, String, String) {
    let seller = client();
    signup_with_role(&seller, "SELLER").await;
    let business = create_business(&seller, "Search Fixture Shop").await;
    let business_id = business["id"].as_str().expect("business id").to_owned();

    let (category_id, subcategory_id) = first_taxonomy_ids(&seller).await;
    for (name, price) in names_prices {
        create_product(
            &seller,
            &business_id,
            &category_id,
            &subcategory_id,
            name,
            price,
            10,
        )
        .await;
    }

    (seller, business_id, subcategory_id)
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn search_is_public_and_respects_price_bounds() {
    let marker = uuid::Uuid::new_v4().to_string();
    let cheap = format!("Cheap {marker}");
    let mid = format!("Mid {marker}");
    let dear = format!("Dear {marker}");
    let (_, _, _) =
        seller_with_catalog(&[(&cheap, "5.00"), (&mid, "50.00"), (&dear, "500.00")]).await;

    let anon = client();
    let resp = anon
        .get(format!("{}/api/products", base_url()))
        .query(&[
            ("search", marker.as_str()),
            ("minPrice", "10"),
            ("maxPrice", "100"),
        ])
        .send()
        .await
        .expect("search request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    let body = resp.json::<Value>().await.expect("not JSON");
    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec![mid.as_str()], "only the in-range product matches");
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn inverted_price_bounds_are_rejected() {
    let anon = client();
    let resp = anon
        .get(format!("{}/api/products", base_url()))
        .query(&[("minPrice", "100"), ("maxPrice", "10")])
        .send()
        .await
        .expect("search request failed");

    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn search_sorts_by_price_ascending() {
    let marker = uuid::Uuid::new_v4().to_string();
    let a = format!("A {marker}");
    let b = format!("B {marker}");
    let c = format!("C {marker}");
    let (_, _, _) = seller_with_catalog(&[(&b, "20.00"), (&c, "30.00"), (&a, "10.00")]).await;

    let anon = client();
    let body = anon
        .get(format!("{}/api/products", base_url()))
        .query(&[
            ("search", marker.as_str()),
            ("sortBy", "price"),
            ("order", "asc"),
        ])
        .send()
        .await
        .expect("search request failed")
        .json::<Value>()
        .await
        .expect("not JSON");

    let names: Vec<&str> = body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert_eq!(names, vec![a.as_str(), b.as_str(), c.as_str()]);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn compare_groups_by_business_with_cheapest_first() {
    // Two sellers list into the same subcategory at different price points.
    let seller_a = client();
    signup_with_role(&seller_a, "SELLER").await;
    let business_a = create_business(&seller_a, "Pricey Place").await;
    let business_a_id = business_a["id"].as_str().expect("id").to_owned();

    let seller_b = client();
    signup_with_role(&seller_b, "SELLER").await;
    let business_b = create_business(&seller_b, "Bargain Barn").await;
    let business_b_id = business_b["id"].as_str().expect("id").to_owned();

    let (category_id, subcategory_id) = first_taxonomy_ids(&seller_a).await;
    create_product(&seller_a, &business_a_id, &category_id, &subcategory_id, "Widget", "40.00", 5)
        .await;
    create_product(&seller_b, &business_b_id, &category_id, &subcategory_id, "Widget", "15.00", 5)
        .await;
    create_product(&seller_b, &business_b_id, &category_id, &subcategory_id, "Gadget", "25.00", 5)
        .await;

    let anon = client();
    let body = anon
        .get(format!("{}/api/products/compare", base_url()))
        .query(&[("subcategoryId", subcategory_id.as_str())])
        .send()
        .await
        .expect("compare request failed")
        .json::<Value>()
        .await
        .expect("not JSON");

    let groups = body["data"]["groups"].as_array().expect("groups array");
    let a_pos = groups
        .iter()
        .position(|g| g["business"]["id"] == business_a_id.as_str())
        .expect("pricey shop present");
    let b_pos = groups
        .iter()
        .position(|g| g["business"]["id"] == business_b_id.as_str())
        .expect("bargain shop present");
    assert!(b_pos < a_pos, "shop holding the cheapest product comes first");

    // Within a group, products stay cheapest-first.
    let b_prices: Vec<&str> = groups[b_pos]["products"]
        .as_array()
        .expect("products array")
        .iter()
        .filter_map(|p| p["price"].as_str())
        .collect();
    assert_eq!(b_prices, vec!["15.00", "25.00"]);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn compare_requires_a_subcategory() {
    let anon = client();
    let resp = anon
        .get(format!("{}/api/products/compare", base_url()))
        .send()
        .await
        .expect("compare request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn foreign_seller_cannot_update_a_product() {
    let owner = client();
    signup_with_role(&owner, "SELLER").await;
    let business = create_business(&owner, "Protected Shop").await;
    let business_id = business["id"].as_str().expect("id");
    let (category_id, subcategory_id) = first_taxonomy_ids(&owner).await;
    let product = create_product(
        &owner,
        business_id,
        &category_id,
        &subcategory_id,
        "Guarded Product",
        "10.00",
        3,
    )
    .await;
    let product_id = product["id"].as_str().expect("id");

    let intruder = client();
    signup_with_role(&intruder, "SELLER").await;

    let form = reqwest::multipart::Form::new().text("price", "0.01");
    let resp = intruder
        .put(format!("{}/api/products/{product_id}", base_url()))
        .multipart(form)
        .send()
        .await
        .expect("update request failed");
    assert_eq!(resp.status(), reqwest::StatusCode::FORBIDDEN);

    let unchanged = intruder
        .get(format!("{}/api/products/{product_id}", base_url()))
        .send()
        .await
        .expect("get request failed")
        .json::<Value>()
        .await
        .expect("not JSON");
    assert_eq!(unchanged["data"]["price"], "10.00");
}
