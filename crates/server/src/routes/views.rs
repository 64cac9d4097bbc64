//! JSON response shapes shared across route modules.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::Serialize;

use store_rating_core::{RatingId, RatingValue, Role, StoreId, UserId};

use crate::models::{Rating, Store, User};

/// Body of responses that only carry a status message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public profile of a user. Never includes the password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    /// Store owned by this user, for store owners.
    pub store_id: Option<StoreId>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.into_inner(),
            address: user.address,
            role: user.role,
            store_id: user.owned_store_id,
        }
    }
}

/// A store as administrators see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub id: StoreId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Store> for StoreView {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            name: store.name,
            email: store.email.into_inner(),
            address: store.address,
            average_rating: store.aggregate.average_rating,
            total_ratings: store.aggregate.total_ratings,
            created_at: store.created_at,
            updated_at: store.updated_at,
        }
    }
}

/// A stored rating row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Rating> for RatingView {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id,
            user_id: rating.user_id,
            store_id: rating.store_id,
            rating: rating.value,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}
