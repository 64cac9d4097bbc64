//! Persistence for users, stores, and ratings.
//!
//! # Tables
//!
//! - `users` - Credentials, profile, role, and the owned-store link
//! - `stores` - Store registry plus the derived rating aggregate
//! - `ratings` - One row per (user, store), unique on that pair
//!
//! # Backends
//!
//! Handlers talk to the [`UserStore`], [`StoreRegistry`], and [`RatingLedger`]
//! traits. [`Database::postgres`] wires the `PostgreSQL` repositories;
//! [`Database::in_memory`] wires [`memory::MemoryBackend`], which the test
//! suites use in place of a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p store-rating-cli -- migrate
//! ```

pub mod memory;
pub mod ratings;
pub mod stores;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use store_rating_core::{Email, RatingValue, StoreId, UserId};

use crate::models::{
    NewStore, NewUser, Rating, RatingWithRater, Store, StoreFilter, StoreWithViewerRating,
    SubmittedRating, User, UserFilter, UserListing,
};

pub use memory::MemoryBackend;
pub use ratings::RatingRepository;
pub use stores::StoreRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Credential store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by ID.
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up a user by (normalized) email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Look up a user together with their password hash, for login.
    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Fetch only the password hash of a user.
    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Insert a user. Returns `Conflict` if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Replace a user's password hash. Returns `NotFound` for unknown users.
    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError>;

    /// Filtered, sorted user listing for administrators.
    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserListing>, RepositoryError>;

    /// Number of users that are not administrators.
    async fn count_non_admin(&self) -> Result<i64, RepositoryError>;
}

/// Store registry.
///
/// Nothing here writes `average_rating` or `total_ratings`; only
/// [`RatingLedger::submit`] changes them.
#[async_trait]
pub trait StoreRegistry: Send + Sync {
    /// Look up a store by ID.
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError>;

    /// Look up a store by (normalized) email.
    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError>;

    /// Resolve the store owned by `owner`, if any.
    async fn get_owned_by(&self, owner: UserId) -> Result<Option<Store>, RepositoryError>;

    /// Create a store and its owner atomically; the owner is linked to the
    /// new store. Returns `Conflict` if either email is taken.
    async fn create_with_owner(
        &self,
        store: NewStore,
        owner: NewUser,
    ) -> Result<(Store, User), RepositoryError>;

    /// Filtered, sorted store listing.
    async fn list(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError>;

    /// Filtered, sorted store listing annotated with `viewer`'s own rating.
    async fn list_for_viewer(
        &self,
        viewer: UserId,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithViewerRating>, RepositoryError>;

    /// Total number of stores.
    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// Rating ledger.
#[async_trait]
pub trait RatingLedger: Send + Sync {
    /// The rating `user` gave `store`, if any.
    async fn find(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError>;

    /// Upsert the (user, store) rating and recompute the store aggregate as
    /// one atomic unit. Returns `NotFound` if the store does not exist, in
    /// which case nothing is written.
    async fn submit(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<SubmittedRating, RepositoryError>;

    /// Every rating of `store` with rater details, newest first.
    async fn list_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError>;

    /// Total number of ratings.
    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// The three repositories the API depends on, behind trait objects.
#[derive(Clone)]
pub struct Database {
    pub users: Arc<dyn UserStore>,
    pub stores: Arc<dyn StoreRegistry>,
    pub ratings: Arc<dyn RatingLedger>,
    pool: Option<PgPool>,
}

impl Database {
    /// `PostgreSQL`-backed repositories sharing one pool.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            stores: Arc::new(StoreRepository::new(pool.clone())),
            ratings: Arc::new(RatingRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repositories backed by one shared in-memory state.
    #[must_use]
    pub fn in_memory() -> Self {
        let backend = MemoryBackend::new();
        Self {
            users: Arc::new(backend.clone()),
            stores: Arc::new(backend.clone()),
            ratings: Arc::new(backend),
            pool: None,
        }
    }

    /// Check that the backing database answers queries.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the probe query fails.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        if let Some(pool) = &self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Build an `ILIKE` pattern matching `term` as a literal substring.
///
/// `%`, `_`, and `\` in the search term are escaped so they match themselves.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Map a unique violation on `sqlx::Error` to `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(err: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("stores_email_key") => "store email already exists",
            Some("users_email_key") => "user email already exists",
            Some("users_owned_store_key") => "store already has an owner",
            _ => "duplicate value",
        };
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(err)
}
