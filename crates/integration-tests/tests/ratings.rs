//! Rating submission and aggregate consistency over HTTP.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use store_rating_integration_tests::{PASSWORD, TestApp, message_of};

#[tokio::test]
async fn test_aggregate_follows_submissions_and_overwrites() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Corner Deli And Grocery", "deli@example.com")
        .await;

    let alice = app.register("alice@example.com").await;
    let bob = app.register("bob@example.com").await;

    let response = app.rate(&alice, &store["id"], 4).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Rating submitted successfully");
    assert_eq!(body["store"]["averageRating"], 4.0);
    assert_eq!(body["store"]["totalRatings"], 1);

    let body: Value = app.rate(&bob, &store["id"], 2).await.json().await.unwrap();
    assert_eq!(body["store"]["averageRating"], 3.0);
    assert_eq!(body["store"]["totalRatings"], 2);

    // Resubmission replaces the old value; the count stays the same.
    let response = app.rate(&alice, &store["id"], 5).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Rating updated successfully");
    assert_eq!(body["store"]["averageRating"], 3.5);
    assert_eq!(body["store"]["totalRatings"], 2);

    let listing: Value = app.get("/api/stores", Some(&alice)).await.json().await.unwrap();
    assert_eq!(listing[0]["averageRating"], 3.5);
    assert_eq!(listing[0]["totalRatings"], 2);
    assert_eq!(listing[0]["userRating"], 5);
    assert!(listing[0].get("email").is_none());
}

#[tokio::test]
async fn test_store_listing_shows_no_rating_for_unrated_store() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_store(&admin, "Unrated Hardware Supply", "hardware@example.com")
        .await;
    let carol = app.register("carol@example.com").await;

    let listing: Value = app.get("/api/stores", Some(&carol)).await.json().await.unwrap();
    assert_eq!(listing[0]["averageRating"], 0.0);
    assert_eq!(listing[0]["totalRatings"], 0);
    assert!(listing[0]["userRating"].is_null());
}

#[tokio::test]
async fn test_out_of_range_rating_is_rejected_without_side_effects() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Riverside Book Exchange", "books@example.com")
        .await;
    let dave = app.register("dave@example.com").await;

    for bad in [0, 6, -1] {
        let response = app.rate(&dave, &store["id"], bad).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "rating {bad}");
    }

    let listing: Value = app.get("/api/stores", Some(&dave)).await.json().await.unwrap();
    assert_eq!(listing[0]["totalRatings"], 0);
}

#[tokio::test]
async fn test_rating_a_missing_store_is_404() {
    let app = TestApp::spawn().await;
    let erin = app.register("erin@example.com").await;

    let response = app.rate(&erin, &Value::from(9999), 3).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message_of(response).await, "Store not found");
}

#[tokio::test]
async fn test_only_normal_users_can_rate() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Hilltop Coffee Roasters", "coffee@example.com")
        .await;

    let response = app.rate(&admin, &store["id"], 5).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let owner = app.login("owner.coffee@example.com", PASSWORD).await;
    let response = app.rate(&owner, &store["id"], 5).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_concurrent_submissions_keep_aggregate_consistent() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Concurrency Test Market", "market@example.com")
        .await;

    let mut tokens = Vec::new();
    for i in 0..10 {
        tokens.push(app.register(&format!("rater{i}@example.com")).await);
    }

    let url = app.url("/api/ratings");
    let mut tasks = tokio::task::JoinSet::new();
    for (i, token) in tokens.iter().enumerate() {
        let client = app.client.clone();
        let url = url.clone();
        let token = token.clone();
        let body = json!({ "storeId": store["id"], "rating": if i % 2 == 0 { 1 } else { 5 } });
        tasks.spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&body)
                .send()
                .await
                .unwrap()
                .status()
        });
    }
    while let Some(status) = tasks.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let listing: Value = app.get("/api/stores", Some(&tokens[0])).await.json().await.unwrap();
    assert_eq!(listing[0]["totalRatings"], 10);
    assert_eq!(listing[0]["averageRating"], 3.0);
}

#[tokio::test]
async fn test_numeric_string_rating_is_accepted() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Corner Stationery Supply", "paper@example.com")
        .await;
    let erin = app.register("erin@example.com").await;

    let response = app
        .post(
            "/api/ratings",
            Some(&erin),
            &json!({ "storeId": store["id"], "rating": "4" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["store"]["averageRating"], 4.0);

    let response = app
        .post(
            "/api/ratings",
            Some(&erin),
            &json!({ "storeId": store["id"], "rating": 2.5 }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
