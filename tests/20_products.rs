mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

use common::{assert_error_body, TestApp};

#[tokio::test]
async fn catalog_is_public_and_paged() -> Result<()> {
    let app = TestApp::new();
    for i in 0..12 {
        app.create_product(&format!("Product {:02}", i)).await;
    }

    let first = app.get("/api/products", None).await;
    assert_eq!(first.status, StatusCode::OK, "{}", first.body);
    assert_eq!(first.body["content"].as_array().map(Vec::len), Some(10));
    assert_eq!(first.body["totalElements"], 12);
    assert_eq!(first.body["totalPages"], 2);
    assert_eq!(first.body["first"], true);
    assert_eq!(first.body["last"], false);

    let second = app.get("/api/products?page=1&size=10", None).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["numberOfElements"], 2);
    assert_eq!(second.body["last"], true);
    Ok(())
}

#[tokio::test]
async fn page_size_is_clamped() -> Result<()> {
    let app = TestApp::new();
    app.create_product("Kettle").await;

    let res = app.get("/api/products?size=1000", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["size"], 100);

    let res = app.get("/api/products?size=0", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["size"], 1);
    Ok(())
}

#[tokio::test]
async fn sort_by_name_descending() -> Result<()> {
    let app = TestApp::new();
    for name in ["Banana", "Apple", "Cherry"] {
        app.create_product(name).await;
    }

    let res = app.get("/api/products?sort=name,desc", None).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let names: Vec<&str> = res.body["content"]
        .as_array()
        .map(|items| items.iter().filter_map(|p| p["name"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(names, ["Cherry", "Banana", "Apple"]);
    Ok(())
}

#[tokio::test]
async fn unknown_sort_field_is_rejected() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/products?sort=password", None).await;

    assert_error_body(&res, StatusCode::BAD_REQUEST, "/api/products");
    Ok(())
}

#[tokio::test]
async fn product_detail_starts_with_empty_rating() -> Result<()> {
    let app = TestApp::new();
    let id = app.create_product("Kettle").await;

    let res = app.get(&format!("/api/products/{}", id), None).await;

    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.body["name"], "Kettle");
    assert_eq!(res.body["price"], 10.0);
    assert_eq!(res.body["reviewCount"], 0);
    assert_eq!(res.body["averageRating"], 0.0);
    Ok(())
}

#[tokio::test]
async fn missing_product_has_structured_not_found() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/products/999", None).await;

    assert_error_body(&res, StatusCode::NOT_FOUND, "/api/products/999");
    assert_eq!(res.body["message"], "Product not found: 999");
    Ok(())
}

#[tokio::test]
async fn non_numeric_id_is_a_bad_request() -> Result<()> {
    let app = TestApp::new();

    let res = app.get("/api/products/abc", None).await;

    assert_error_body(&res, StatusCode::BAD_REQUEST, "/api/products/abc");
    Ok(())
}

#[tokio::test]
async fn admin_creates_products() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let res = app
        .post(
            "/api/admin/products",
            Some(&admin),
            json!({"name": "Kettle", "description": "1.7l", "category": "Kitchen", "price": 24.99}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);
    assert_eq!(res.body["price"], 24.99);

    let id = res.body["id"].as_i64().unwrap_or_default();
    let fetched = app.get(&format!("/api/products/{}", id), None).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["category"], "Kitchen");
    Ok(())
}

#[tokio::test]
async fn invalid_product_is_rejected() -> Result<()> {
    let app = TestApp::new();
    let admin = app.admin_token().await;

    let res = app
        .post(
            "/api/admin/products",
            Some(&admin),
            json!({"name": " ", "category": "Kitchen", "price": -1.0}),
        )
        .await;

    assert_error_body(&res, StatusCode::BAD_REQUEST, "/api/admin/products");
    assert_eq!(res.body["details"].as_array().map(Vec::len), Some(2), "{}", res.body);
    Ok(())
}
