//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::SecretString;

use crate::db::Database;
use crate::services::auth::TokenKeys;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    db: Database,
    tokens: TokenKeys,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(db: Database, jwt_secret: &SecretString) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                db,
                tokens: TokenKeys::new(jwt_secret),
            }),
        }
    }

    /// Get a reference to the repositories.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }

    /// Get a reference to the bearer token keys.
    #[must_use]
    pub fn tokens(&self) -> &TokenKeys {
        &self.inner.tokens
    }
}
