//! Specials, promo codes and free item picks through the storefront router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use llama_treats_integration_tests::{Visitor, amount, pickup_form};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn test_lists_live_specials_without_codes() {
    let mut visitor = Visitor::new();
    let (status, body) = visitor.get("/api/specials").await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<_> = body["specials"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    // The New Year clearance has ended.
    assert_eq!(ids, vec![1, 2, 3, 4]);

    assert_eq!(body["specials"][2]["code_required"], true);
    assert_eq!(body["specials"][2]["label"], "$5 OFF Bundle");
    assert!(!body.to_string().contains("BRUNCH5"));
}

#[tokio::test]
async fn test_single_special_tracks_cart() {
    let mut visitor = Visitor::new();
    visitor
        .post("/api/cart/add", json!({ "product_id": 5, "quantity": 2 }))
        .await;

    let (status, special) = visitor.get("/api/specials/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(special["type"], "percentage_discount");
    assert_eq!(special["label"], "20% OFF");
    assert_eq!(special["eligibility"]["satisfied"], true);
    assert_eq!(amount(&special["eligibility"]["qualifying_subtotal"]), Decimal::new(1150, 2));

    let (status, _) = visitor.get("/api/specials/5").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = visitor.get("/api/specials/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_progress_toward_buy_x_get_y() {
    let mut visitor = Visitor::new();
    visitor
        .post("/api/cart/add", json!({ "product_id": 1, "quantity": 8 }))
        .await;

    let (_, special) = visitor.get("/api/specials/2").await;
    assert_eq!(special["eligibility"]["satisfied"], false);
    assert_eq!(special["eligibility"]["remaining"], 4);
    assert_eq!(special["progress"], "Add 4 more item(s) to qualify!");

    visitor
        .post("/api/cart/add", json!({ "product_id": 2, "quantity": 4 }))
        .await;
    let (_, special) = visitor.get("/api/specials/2").await;
    assert_eq!(special["eligibility"]["satisfied"], true);
    assert_eq!(special["progress"], "You qualify for 1 FREE item(s)!");
}

#[tokio::test]
async fn test_validate_code() {
    let mut visitor = Visitor::new();

    let (status, body) = visitor
        .post("/api/specials/validate-code", json!({ "code": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "please enter a promo code");

    let (status, body) = visitor
        .post("/api/specials/validate-code", json!({ "code": "FREECAKE" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "invalid promo code");

    // Codes match regardless of case and surrounding spaces.
    let (status, special) = visitor
        .post("/api/specials/validate-code", json!({ "code": "  brunch5 " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(special["id"], 3);
    assert_eq!(special["name"], "Weekend Brunch Bundle");
    assert!(!special.to_string().contains("BRUNCH5"));
}

#[tokio::test]
async fn test_code_used_up_at_the_bakery() {
    let mut visitor = Visitor::new();
    visitor
        .post("/api/cart/add", json!({ "product_id": 1, "quantity": 4 }))
        .await;
    let (status, _) = visitor
        .post("/api/specials/validate-code", json!({ "code": "BRUNCH5" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // The last use goes to another customer before this one checks out.
    visitor.api().use_up_code("BRUNCH5");

    let (status, _) = visitor
        .post("/api/specials/validate-code", json!({ "code": "BRUNCH5" }))
        .await;
    assert_eq!(status, StatusCode::GONE);

    let mut form = pickup_form();
    form["promoCode"] = json!("BRUNCH5");
    let (status, _) = visitor.post("/api/checkout", form).await;
    assert_eq!(status, StatusCode::GONE);
    assert!(visitor.api().checkout_requests().is_empty());
}

#[tokio::test]
async fn test_free_item_picks() {
    let mut visitor = Visitor::new();
    visitor
        .post("/api/cart/add", json!({ "product_id": 1, "quantity": 8 }))
        .await;

    // Not yet earned.
    let (status, _) = visitor.get("/api/specials/2/free-items").await;
    assert_eq!(status, StatusCode::CONFLICT);

    visitor
        .post("/api/cart/add", json!({ "product_id": 1, "quantity": 4 }))
        .await;
    let (status, picks) = visitor.get("/api/specials/2/free-items").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(picks["remaining"], 1);
    assert_eq!(picks["choices"], json!([1, 2]));

    // Sourdough is not a pastry.
    let (status, _) = visitor
        .post(
            "/api/specials/2/free-items",
            json!({ "action": "add", "product_id": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = visitor
        .post("/api/specials/2/free-items", json!({ "action": "add" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, picks) = visitor
        .post(
            "/api/specials/2/free-items",
            json!({ "action": "add", "product_id": 2 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(picks["complete"], true);
    assert_eq!(picks["items"], json!([{ "product_id": 2, "quantity": 1 }]));

    let (status, body) = visitor
        .post(
            "/api/specials/2/free-items",
            json!({ "action": "add", "product_id": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "you have already chosen all 1 free item(s)");

    // The picks are kept in the session.
    let (_, picks) = visitor.get("/api/specials/2/free-items").await;
    assert_eq!(picks["selected"], 1);

    let (_, picks) = visitor
        .post(
            "/api/specials/2/free-items",
            json!({ "action": "remove", "product_id": 2 }),
        )
        .await;
    assert_eq!(picks["selected"], 0);
    assert_eq!(picks["remaining"], 1);
}
