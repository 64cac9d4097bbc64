//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/register       - Self-registration (role normal)
//! POST /api/auth/login          - Exchange credentials for a bearer token
//! PUT  /api/auth/password       - Change own password (any role)
//!
//! # Admin (ManagePlatform)
//! GET  /api/admin/dashboard     - Platform counters
//! GET  /api/admin/users         - User listing (search, role, sort)
//! POST /api/admin/users         - Create user with any role
//! GET  /api/admin/stores        - Store listing (search, sort)
//! POST /api/admin/stores        - Create store and its owner
//!
//! # Rating (RateStores)
//! GET  /api/stores              - Store listing with the caller's own rating
//! POST /api/ratings             - Submit or overwrite a rating
//!
//! # Store owner (ViewOwnedStore)
//! GET  /api/store-owner/dashboard - Owned store aggregate and rating history
//! ```

pub mod admin;
pub mod auth;
pub mod ratings;
pub mod store_owner;
pub mod stores;
pub mod views;

use axum::{
    Router,
    extract::{FromRequest, FromRequestParts},
    routing::{get, post, put},
};

use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// JSON body extractor whose rejection is a 400 with a JSON message.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejection is a 400 with a JSON message.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes(rate_limited: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/password", put(auth::update_password));

    if rate_limited {
        router.layer(auth_rate_limiter())
    } else {
        router
    }
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(admin::dashboard))
        .route("/users", get(admin::list_users).post(admin::create_user))
        .route("/stores", get(admin::list_stores).post(admin::create_store))
}

/// Create all API routes, to be nested under `/api`.
pub fn routes(auth_rate_limit: bool) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(auth_rate_limit))
        .nest("/admin", admin_routes())
        .route("/stores", get(stores::list))
        .route("/ratings", post(ratings::submit))
        .route("/store-owner/dashboard", get(store_owner::dashboard))
}
