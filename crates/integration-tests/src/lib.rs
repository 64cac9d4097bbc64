//! Integration tests for the store rating API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory backend, no services needed
//! cargo test -p store-rating-integration-tests
//!
//! # Also run the PostgreSQL-backed tests
//! TEST_DATABASE_URL=postgres://localhost/store_rating_test \
//!     cargo test -p store-rating-integration-tests -- --include-ignored
//! ```
//!
//! [`TestApp`] binds the real router to an ephemeral port, so every test goes
//! through the full middleware stack over HTTP.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::net::SocketAddr;

use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;

use store_rating_core::{Address, Email, Password, PersonName, Role};
use store_rating_server::app::{RouterOptions, router};
use store_rating_server::db::Database;
use store_rating_server::services::{AdminService, UserInput};
use store_rating_server::state::AppState;

/// Signing key used by every test server.
pub const TEST_JWT_SECRET: &str = "k3J9xQ2mV8pL5wR7tY1uZ4nB6cD0fG3hJ";

/// Password that satisfies the password policy.
pub const PASSWORD: &str = "Secret#Pass1";

/// Email of the administrator seeded into every [`TestApp`].
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// A running API server and a client pointed at it.
pub struct TestApp {
    pub client: Client,
    pub base_url: String,
}

impl TestApp {
    /// Start a server over the in-memory backend.
    pub async fn spawn() -> Self {
        Self::spawn_with(Database::in_memory()).await
    }

    /// Start a server over `PostgreSQL`, or `None` when `TEST_DATABASE_URL`
    /// is unset. Migrations are applied and all tables emptied first.
    pub async fn spawn_postgres() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("../server/migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");
        sqlx::query("TRUNCATE ratings, users, stores RESTART IDENTITY CASCADE")
            .execute(&pool)
            .await
            .expect("Failed to reset test database");

        Some(Self::spawn_with(Database::postgres(pool)).await)
    }

    async fn spawn_with(db: Database) -> Self {
        seed_admin(&db).await;

        let state = AppState::new(db, &SecretString::from(TEST_JWT_SECRET));
        let app = router(state, RouterOptions::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
        }
    }

    /// Absolute URL for an API path such as `/api/stores`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `GET` with an optional bearer token.
    pub async fn get(&self, path: &str, token: Option<&str>) -> Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("GET request failed")
    }

    /// `POST` a JSON body with an optional bearer token.
    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> Response {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("POST request failed")
    }

    /// `PUT` a JSON body with a bearer token.
    pub async fn put(&self, path: &str, token: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("PUT request failed")
    }

    /// Log in and return the bearer token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK, "login failed for {email}");
        token_of(response).await
    }

    /// Token for the seeded administrator.
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, PASSWORD).await
    }

    /// Self-register a normal user and return their token.
    pub async fn register(&self, email: &str) -> String {
        let response = self
            .post(
                "/api/auth/register",
                None,
                &json!({
                    "name": "Integration Test Rating User",
                    "email": email,
                    "password": PASSWORD,
                    "address": "42 Test Avenue",
                }),
            )
            .await;
        assert_eq!(
            response.status(),
            StatusCode::CREATED,
            "registration failed for {email}"
        );
        token_of(response).await
    }

    /// Create a store and its owner as admin; returns the store JSON.
    pub async fn create_store(&self, admin_token: &str, name: &str, email: &str) -> Value {
        let owner_email = format!("owner.{email}");
        let response = self
            .post(
                "/api/admin/stores",
                Some(admin_token),
                &json!({
                    "name": name,
                    "email": email,
                    "address": "7 Market Street",
                    "ownerName": "Integration Test Store Owner",
                    "ownerEmail": owner_email,
                    "ownerPassword": PASSWORD,
                    "ownerAddress": "8 Market Street",
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "store creation failed");

        let body: Value = response.json().await.expect("store response is JSON");
        body["store"].clone()
    }

    /// Submit a rating and return the response.
    pub async fn rate(&self, token: &str, store_id: &Value, rating: i64) -> Response {
        self.post(
            "/api/ratings",
            Some(token),
            &json!({ "storeId": store_id, "rating": rating }),
        )
        .await
    }
}

async fn seed_admin(db: &Database) {
    let input = UserInput {
        name: PersonName::parse("Seeded Platform Administrator").expect("valid name"),
        email: Email::parse(ADMIN_EMAIL).expect("valid email"),
        password: Password::parse(PASSWORD).expect("valid password"),
        address: Address::parse("1 Admin Plaza").expect("valid address"),
    };
    AdminService::new(db)
        .create_user(input, Role::Admin)
        .await
        .expect("Failed to seed administrator");
}

/// Extract the `token` field from a register/login response.
pub async fn token_of(response: Response) -> String {
    let body: Value = response.json().await.expect("auth response is JSON");
    body["token"]
        .as_str()
        .expect("auth response carries a token")
        .to_owned()
}

/// Read the `message` field of a JSON error body.
pub async fn message_of(response: Response) -> String {
    let body: Value = response.json().await.expect("error response is JSON");
    body["message"].as_str().unwrap_or_default().to_owned()
}
