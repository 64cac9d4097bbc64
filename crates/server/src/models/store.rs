//! Store domain types.

use chrono::{DateTime, Utc};

use store_rating_core::{Address, Email, RatingAggregate, RatingValue, StoreId, StoreName};

/// A store (domain type).
#[derive(Debug, Clone)]
pub struct Store {
    /// Unique store ID.
    pub id: StoreId,
    /// Display name.
    pub name: String,
    /// Contact email (unique).
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Derived rating state; only the rating ledger writes it.
    pub aggregate: RatingAggregate,
    /// When the store was created.
    pub created_at: DateTime<Utc>,
    /// When the store was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a store.
#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: StoreName,
    pub email: Email,
    pub address: Address,
}

/// A store annotated with the viewing user's own rating, if they left one.
#[derive(Debug, Clone)]
pub struct StoreWithViewerRating {
    pub store: Store,
    pub user_rating: Option<RatingValue>,
}
