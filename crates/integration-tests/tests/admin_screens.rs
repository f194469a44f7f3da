//! Admin list screens, bulk actions and settings forms.

#![allow(clippy::unwrap_used)]

use meridian_integration_tests::{TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_dashboard_and_security_headers() {
    let app = TestApp::admin().await;
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store");
    assert!(headers.contains_key("x-request-id"));
    assert!(response.text().await.unwrap().contains("Recent orders"));
}

#[tokio::test]
async fn test_product_filters() {
    let app = TestApp::admin().await;
    let body = app
        .get("/products?search=chelsea")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("Leather Chelsea Boot"));
    assert!(!body.contains("Organic Cotton Tee"));

    let body = app
        .get("/products?search=nothing-matches-this")
        .await
        .text()
        .await
        .unwrap();
    assert!(body.contains("No products found"));
}

#[tokio::test]
async fn test_bulk_delete_products() {
    let app = TestApp::admin().await;
    let response = app
        .post_form("/products/bulk", &[("action", "delete"), ("ids", "2")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/products?success=Deleted+1+item%28s%29"
    );

    let flashed = app.get(&location(&response)).await.text().await.unwrap();
    assert!(flashed.contains("Deleted 1 item(s)"));

    let body = app.get("/products").await.text().await.unwrap();
    assert!(!body.contains("Linen Camp Shirt"));
    assert!(!body.contains("Deleted 1 item(s)"));
}

#[tokio::test]
async fn test_bulk_partial_failure_and_bad_input() {
    let app = TestApp::admin().await;
    let response = app
        .post_form("/products/bulk", &[("action", "archive"), ("ids", "3,999")])
        .await;
    assert_eq!(response.status(), StatusCode::MULTI_STATUS);
    assert!(response.text().await.unwrap().contains("999"));

    let response = app
        .post_form("/products/bulk", &[("action", "delete"), ("ids", "")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .post_form("/products/bulk", &[("action", "explode"), ("ids", "1")])
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_coupon_toggle_over_htmx() {
    let app = TestApp::admin().await;
    let response = app
        .client
        .post(app.url("/marketing/coupons/1/toggle"))
        .header("hx-request", "true")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get("hx-trigger").unwrap(), "toggled");
    let fragment = response.text().await.unwrap();
    assert!(fragment.contains("aria-checked=\"false\""));

    let response = app.post_form("/marketing/coupons/1/toggle", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/marketing/coupons?success="));
}

#[tokio::test]
async fn test_duplicate_coupon_code_is_rejected() {
    let app = TestApp::admin().await;
    let response = app
        .post_form(
            "/marketing/coupons",
            &[
                ("code", "welcome10"),
                ("discount_type", "percentage"),
                ("value", "5"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_order_transition_flashes_error() {
    let app = TestApp::admin().await;
    let response = app
        .post_form("/orders/ORD1746195667123417/status", &[("status", "pending")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/orders/ORD1746195667123417?error="));

    let response = app.get("/orders/ORD99").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tax_settings_validation() {
    let app = TestApp::admin().await;
    let response = app
        .post_form("/settings/tax", &[("rate", "120")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        response
            .text()
            .await
            .unwrap()
            .contains("tax rate must be between 0% and 100%")
    );

    let response = app
        .post_form("/settings/tax", &[("rate", "7.5"), ("tax_id", "US-123")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/settings/tax?success=Settings+saved");

    let body = app.get("/settings/tax").await.text().await.unwrap();
    assert!(body.contains("value=\"7.5\""));
}
