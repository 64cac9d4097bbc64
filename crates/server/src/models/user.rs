//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use store_rating_core::{Address, Email, PersonName, Role, StoreId, UserId};

/// A platform user (domain type).
///
/// Never carries the password hash; that is fetched separately and only by
/// the auth service.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Full name.
    pub name: String,
    /// Normalized email address.
    pub email: Email,
    /// Postal address.
    pub address: String,
    /// Platform role.
    pub role: Role,
    /// Store owned by this user (store owners only).
    pub owned_store_id: Option<StoreId>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: PersonName,
    pub email: Email,
    /// Argon2 PHC string; never plaintext.
    pub password_hash: String,
    pub address: Address,
    pub role: Role,
}

/// A user row in the admin listing, with the owned store's average if any.
#[derive(Debug, Clone)]
pub struct UserListing {
    pub user: User,
    pub store_rating: Option<f64>,
}

/// The authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
}
