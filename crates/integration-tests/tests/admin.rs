//! Administrator endpoints and the store owner dashboard.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use store_rating_integration_tests::{PASSWORD, TestApp, message_of};

#[tokio::test]
async fn test_create_store_links_owner() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let store = app
        .create_store(&admin, "Lakeside Fish Market Co", "fish@example.com")
        .await;
    assert_eq!(store["averageRating"], 0.0);
    assert_eq!(store["totalRatings"], 0);
    assert_eq!(store["owner"]["email"], "owner.fish@example.com");

    let owner = app.login("owner.fish@example.com", PASSWORD).await;
    let rater = app.register("judy@example.com").await;
    app.rate(&rater, &store["id"], 4).await;

    let response = app.get("/api/store-owner/dashboard", Some(&owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard: Value = response.json().await.unwrap();
    assert_eq!(dashboard["store"]["id"], store["id"]);
    assert_eq!(dashboard["store"]["averageRating"], 4.0);
    assert_eq!(dashboard["store"]["totalRatings"], 1);
    assert_eq!(dashboard["ratings"][0]["rating"], 4);
    assert_eq!(dashboard["ratings"][0]["user"]["email"], "judy@example.com");
}

#[tokio::test]
async fn test_create_store_duplicate_emails_create_nothing() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_store(&admin, "Original Bakery Storefront", "bakery@example.com")
        .await;

    let response = app
        .post(
            "/api/admin/stores",
            Some(&admin),
            &json!({
                "name": "Duplicate Bakery Storefront",
                "email": "BAKERY@example.com",
                "address": "9 Market Street",
                "ownerName": "Second Bakery Store Owner",
                "ownerEmail": "second.owner@example.com",
                "ownerPassword": PASSWORD,
                "ownerAddress": "9 Market Street",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(response).await,
        "Store already exists with this email"
    );

    // Owner email collides with an existing user: the store must not appear.
    let response = app
        .post(
            "/api/admin/stores",
            Some(&admin),
            &json!({
                "name": "Orphan Candidate Storefront",
                "email": "orphan@example.com",
                "address": "10 Market Street",
                "ownerName": "Colliding Store Owner Name",
                "ownerEmail": "owner.bakery@example.com",
                "ownerPassword": PASSWORD,
                "ownerAddress": "10 Market Street",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message_of(response).await,
        "User already exists with this email"
    );

    let stores: Value = app
        .get("/api/admin/stores", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stores.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Dashboard Count Emporium", "counts@example.com")
        .await;
    let rater = app.register("kim@example.com").await;
    app.rate(&rater, &store["id"], 3).await;

    let stats: Value = app
        .get("/api/admin/dashboard", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stats["totalStores"], 1);
    assert_eq!(stats["totalRatings"], 1);
    assert!(stats["totalUsers"].as_i64().unwrap() >= 2);
}

#[tokio::test]
async fn test_admin_creates_user_with_role() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/api/admin/users",
            Some(&admin),
            &json!({
                "name": "Second Platform Administrator",
                "email": "admin2@example.com",
                "password": PASSWORD,
                "address": "2 Admin Plaza",
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["role"], "admin");

    let second = app.login("admin2@example.com", PASSWORD).await;
    let response = app.get("/api/admin/dashboard", Some(&second)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .post(
            "/api/admin/users",
            Some(&admin),
            &json!({
                "name": "Unknown Role Platform User",
                "email": "role@example.com",
                "password": PASSWORD,
                "address": "3 Admin Plaza",
                "role": "superuser",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_listing_filters_and_sorts() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let store = app
        .create_store(&admin, "Listing Filter Bazaar", "bazaar@example.com")
        .await;
    let rater = app.register("liam@example.com").await;
    app.rate(&rater, &store["id"], 5).await;

    let owners: Value = app
        .get("/api/admin/users?role=store_owner", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    let owners = owners.as_array().unwrap();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0]["email"], "owner.bazaar@example.com");
    assert_eq!(owners[0]["rating"], 5.0);

    let found: Value = app
        .get("/api/admin/users?search=LIAM", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);

    let sorted: Value = app
        .get("/api/admin/users?sortBy=email&sortOrder=desc", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    let emails: Vec<&str> = sorted
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    let mut expected = emails.clone();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(emails, expected);
}

#[tokio::test]
async fn test_unknown_sort_is_400() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    for path in [
        "/api/admin/stores?sortBy=password",
        "/api/admin/users?sortOrder=sideways",
    ] {
        let response = app.get(path, Some(&admin)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }

    let rater = app.register("mia@example.com").await;
    let response = app.get("/api/stores?sortBy=email", Some(&rater)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_search_is_case_insensitive() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_store(&admin, "Northside Garden Center", "garden@example.com")
        .await;
    app.create_store(&admin, "Southside Pet Supplies", "pets@example.com")
        .await;
    let rater = app.register("noah@example.com").await;

    let found: Value = app
        .get("/api/stores?search=gArDeN", Some(&rater))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["name"], "Northside Garden Center");

    // Viewers cannot search by store email; admins can.
    let found: Value = app
        .get("/api/stores?search=pets@", Some(&rater))
        .await
        .json()
        .await
        .unwrap();
    assert!(found.as_array().unwrap().is_empty());

    let found: Value = app
        .get("/api/admin/stores?search=pets@", Some(&admin))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.as_array().unwrap().len(), 1);
}
