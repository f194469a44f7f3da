//! End-to-end checkout flow against the storefront.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use meridian_core::OrderNumber;
use meridian_core::seed::SeedData;
use meridian_integration_tests::{TestApp, location};
use meridian_storefront::config::StorefrontConfig;
use reqwest::StatusCode;

const SHIPPING: &[(&str, &str)] = &[
    ("full_name", "Maya Chen"),
    ("address_line1", "12 Harbor Street"),
    ("address_line2", ""),
    ("city", "Portland"),
    ("state", "OR"),
    ("postal_code", "97201"),
    ("country", "US"),
    ("phone", "503-555-0142"),
    ("shipping_option", "express"),
];

async fn add_tee(app: &TestApp, quantity: &str) {
    let response = app
        .post_form(
            "/cart/add",
            &[
                ("product_id", "1"),
                ("quantity", quantity),
                ("size", "M"),
                ("color", "White"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::storefront().await;
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_checkout_with_empty_cart_goes_back_to_cart() {
    let app = TestApp::storefront().await;
    let response = app.get("/checkout/shipping").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_review_before_shipping_redirects_to_shipping() {
    let app = TestApp::storefront().await;
    add_tee(&app, "1").await;

    let response = app.get("/checkout/review").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout/shipping");

    let response = app.get("/checkout").await;
    assert_eq!(location(&response), "/checkout/shipping");
}

#[tokio::test]
async fn test_search_without_matches_shows_empty_state() {
    let app = TestApp::storefront().await;
    let response = app.get("/products?q=zzz-no-such-thing").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("No products found"));
}

#[tokio::test]
async fn test_quantity_is_clamped_to_line_maximum() {
    let app = TestApp::storefront().await;
    add_tee(&app, "50").await;

    let badge = app.get("/cart/count").await.text().await.unwrap();
    assert!(badge.contains(">10<"), "unexpected badge: {badge}");
}

#[tokio::test]
async fn test_invalid_card_is_rejected() {
    let app = TestApp::storefront().await;
    add_tee(&app, "1").await;
    app.post_form("/checkout/shipping", SHIPPING).await;

    let response = app
        .post_form(
            "/checkout/payment",
            &[
                ("payment_type", "credit-card"),
                ("card_number", "1234"),
                ("cardholder_name", "Maya Chen"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.get("/checkout/review").await;
    assert_eq!(location(&response), "/checkout/payment");
}

async fn fill_shipping_and_payment(app: &TestApp) {
    let response = app.post_form("/checkout/shipping", SHIPPING).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout/payment");

    let response = app
        .post_form(
            "/checkout/payment",
            &[
                ("payment_type", "credit-card"),
                ("card_number", "4242 4242 4242 4242"),
                ("cardholder_name", "Maya Chen"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/checkout/review");
}

/// The order number between `<strong>` tags on the confirmation page.
fn confirmed_order_number(body: &str) -> OrderNumber {
    let start = body.find("Your order <strong>").unwrap() + "Your order <strong>".len();
    let end = start + body[start..].find("</strong>").unwrap();
    OrderNumber::parse(&body[start..end]).unwrap()
}

async fn place_order(app: &TestApp) -> String {
    let response = app.post_form("/checkout/place-order", &[]).await;
    assert_eq!(location(&response), "/checkout/success");
    app.get("/checkout/success").await.text().await.unwrap()
}

#[tokio::test]
async fn test_full_checkout_places_order_and_clears_cart() {
    let app = TestApp::storefront().await;
    add_tee(&app, "2").await;
    fill_shipping_and_payment(&app).await;

    let review = app.get("/checkout/review").await;
    assert_eq!(review.status(), StatusCode::OK);
    assert!(review.text().await.unwrap().contains("4242"));

    let response = app.post_form("/checkout/place-order", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/checkout/success");

    let confirmation = app.get("/checkout/success").await;
    assert_eq!(confirmation.status(), StatusCode::OK);
    let body = confirmation.text().await.unwrap();
    let number = confirmed_order_number(&body);
    // Millisecond timestamp plus a suffix of one to three digits.
    assert!(number.as_str().len() >= "ORD".len() + 13 + 1);
    assert!(body.contains("Express Shipping"));

    let badge = app.get("/cart/count").await.text().await.unwrap();
    assert!(!badge.contains("cart-badge"));

    let response = app.get("/checkout/shipping").await;
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_confirmation_expires_after_window() {
    let app = TestApp::storefront_with(StorefrontConfig {
        confirmation_ttl: Duration::ZERO,
        ..StorefrontConfig::default()
    })
    .await;
    add_tee(&app, "1").await;
    fill_shipping_and_payment(&app).await;

    let response = app.post_form("/checkout/place-order", &[]).await;
    assert_eq!(location(&response), "/checkout/success");

    for _ in 0..2 {
        let response = app.get("/checkout/success").await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn test_coupon_usage_limit_counts_placed_orders() {
    let mut seed = SeedData::load().unwrap();
    let welcome = seed
        .coupons
        .iter_mut()
        .find(|c| c.code == "WELCOME10")
        .unwrap();
    welcome.usage_limit = Some(welcome.usage_count + 1);
    let first = TestApp::storefront_seeded(StorefrontConfig::default(), seed).await;
    let second = first.new_visitor();
    let third = first.new_visitor();

    for visitor in [&first, &second] {
        add_tee(visitor, "1").await;
        let response = visitor
            .post_form("/cart/coupon", &[("code", "welcome10")])
            .await;
        assert_eq!(location(&response), "/cart");
        fill_shipping_and_payment(visitor).await;
    }

    let body = place_order(&first).await;
    assert!(body.contains("Discount (WELCOME10)"));

    // Applied before the last use went, so it no longer takes anything off.
    let body = place_order(&second).await;
    assert!(!body.contains("Discount (WELCOME10)"));

    add_tee(&third, "1").await;
    let response = third
        .post_form("/cart/coupon", &[("code", "WELCOME10")])
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.text().await.unwrap().contains("usage limit"));
}
