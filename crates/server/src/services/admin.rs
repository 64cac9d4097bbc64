//! Platform administration: user and store creation, listings, and stats.

use serde::Serialize;
use thiserror::Error;

use store_rating_core::{Address, Email, Password, PersonName, Role};

use super::auth::{AuthError, hash_password};
use crate::db::{Database, RepositoryError};
use crate::models::{NewStore, NewUser, Store, StoreFilter, User, UserFilter, UserListing};

/// Errors from the admin service.
#[derive(Debug, Error)]
pub enum AdminError {
    /// A user with this email already exists.
    #[error("user email already exists")]
    UserEmailTaken,

    /// A store with this email already exists.
    #[error("store email already exists")]
    StoreEmailTaken,

    /// Password hashing failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Platform-wide counters for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Users that are not administrators.
    pub total_users: i64,
    pub total_stores: i64,
    pub total_ratings: i64,
}

/// Validated input for an admin-created user or store owner.
#[derive(Debug)]
pub struct UserInput {
    pub name: PersonName,
    pub email: Email,
    pub password: Password,
    pub address: Address,
}

/// Admin service.
pub struct AdminService<'a> {
    db: &'a Database,
}

impl<'a> AdminService<'a> {
    /// Create an admin service over the given repositories.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Platform counters.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` on storage failure.
    pub async fn dashboard(&self) -> Result<DashboardStats, AdminError> {
        let (total_users, total_stores, total_ratings) = tokio::try_join!(
            self.db.users.count_non_admin(),
            self.db.stores.count(),
            self.db.ratings.count(),
        )?;

        Ok(DashboardStats {
            total_users,
            total_stores,
            total_ratings,
        })
    }

    /// Create a user with any role.
    ///
    /// Store owners are normally created together with their store through
    /// [`Self::create_store`]; one created here owns nothing until linked.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::UserEmailTaken` if the email is already registered.
    pub async fn create_user(&self, input: UserInput, role: Role) -> Result<User, AdminError> {
        if self.db.users.get_by_email(&input.email).await?.is_some() {
            return Err(AdminError::UserEmailTaken);
        }

        let new_user = new_user(input, role).await?;
        let user = self.db.users.create(new_user).await.map_err(map_conflict)?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created by admin");
        Ok(user)
    }

    /// Create a store and its owner account in one step. The owner gets the
    /// `store_owner` role and is linked to the new store.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::StoreEmailTaken` or `AdminError::UserEmailTaken`
    /// if either email is in use; nothing is created in that case.
    pub async fn create_store(
        &self,
        store: NewStore,
        owner: UserInput,
    ) -> Result<(Store, User), AdminError> {
        if self.db.stores.get_by_email(&store.email).await?.is_some() {
            return Err(AdminError::StoreEmailTaken);
        }
        if self.db.users.get_by_email(&owner.email).await?.is_some() {
            return Err(AdminError::UserEmailTaken);
        }

        let owner = new_user(owner, Role::StoreOwner).await?;
        let (store, owner) = self
            .db
            .stores
            .create_with_owner(store, owner)
            .await
            .map_err(map_conflict)?;

        tracing::info!(store_id = %store.id, owner_id = %owner.id, "store created");
        Ok((store, owner))
    }

    /// Filtered user listing with each store owner's average rating.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` on storage failure.
    pub async fn list_users(&self, filter: &UserFilter) -> Result<Vec<UserListing>, AdminError> {
        Ok(self.db.users.list(filter).await?)
    }

    /// Filtered store listing; the search also matches store emails.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Repository` on storage failure.
    pub async fn list_stores(&self, filter: StoreFilter) -> Result<Vec<Store>, AdminError> {
        let filter = StoreFilter {
            search_email: true,
            ..filter
        };
        Ok(self.db.stores.list(&filter).await?)
    }
}

async fn new_user(input: UserInput, role: Role) -> Result<NewUser, AdminError> {
    Ok(NewUser {
        name: input.name,
        email: input.email,
        password_hash: hash_password(input.password).await?,
        address: input.address,
        role,
    })
}

/// Unique-constraint races that slipped past the pre-checks.
fn map_conflict(err: RepositoryError) -> AdminError {
    match err {
        RepositoryError::Conflict(ref msg) if msg.starts_with("store") => {
            AdminError::StoreEmailTaken
        }
        RepositoryError::Conflict(_) => AdminError::UserEmailTaken,
        other => AdminError::Repository(other),
    }
}
