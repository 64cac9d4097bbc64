//! Administrator endpoints: dashboard, user and store management.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_rating_core::{Address, Email, Password, PersonName, Role, SortOrder, StoreName, UserId};

use super::stores::StoreListQuery;
use super::views::{StoreView, UserView};
use super::{ApiJson, ApiQuery};
use crate::error::Result;
use crate::middleware::{ManagePlatform, RequireCapability};
use crate::models::{NewStore, UserFilter, UserListing, UserSortField, normalize_search};
use crate::services::{AdminService, DashboardStats, UserInput};
use crate::state::AppState;

// =============================================================================
// Dashboard
// =============================================================================

/// Platform counters.
///
/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    RequireCapability(_, _): RequireCapability<ManagePlatform>,
) -> Result<Json<DashboardStats>> {
    Ok(Json(AdminService::new(state.db()).dashboard().await?))
}

// =============================================================================
// Users
// =============================================================================

/// Admin user creation form; `role` defaults to `normal`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub message: &'static str,
    pub user: UserView,
}

/// Create a user with any role.
///
/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireCapability(_, _): RequireCapability<ManagePlatform>,
    ApiJson(form): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    let role = form.role.as_deref().map(str::parse::<Role>).transpose()?.unwrap_or_default();
    let input = UserInput {
        name: PersonName::parse(&form.name)?,
        email: Email::parse(&form.email)?,
        password: Password::parse(&form.password)?,
        address: Address::parse(&form.address)?,
    };

    let user = AdminService::new(state.db()).create_user(input, role).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            message: "User created successfully",
            user: user.into(),
        }),
    ))
}

/// `?search=&role=&sortBy=&sortOrder=` for the user listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl TryFrom<UserListQuery> for UserFilter {
    type Error = crate::error::AppError;

    fn try_from(query: UserListQuery) -> Result<Self> {
        Ok(Self {
            search: normalize_search(query.search),
            role: normalize_search(query.role)
                .as_deref()
                .map(str::parse::<Role>)
                .transpose()?,
            sort_by: query
                .sort_by
                .as_deref()
                .map(str::parse::<UserSortField>)
                .transpose()?
                .unwrap_or_default(),
            sort_order: query
                .sort_order
                .as_deref()
                .map(str::parse::<SortOrder>)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// One row of the admin user listing.
#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    /// Average rating of the user's store, for store owners.
    pub rating: Option<f64>,
}

impl From<UserListing> for UserListItem {
    fn from(listing: UserListing) -> Self {
        Self {
            id: listing.user.id,
            name: listing.user.name,
            email: listing.user.email.into_inner(),
            address: listing.user.address,
            role: listing.user.role,
            rating: listing.store_rating,
        }
    }
}

/// Filtered, sorted user listing.
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireCapability(_, _): RequireCapability<ManagePlatform>,
    ApiQuery(query): ApiQuery<UserListQuery>,
) -> Result<Json<Vec<UserListItem>>> {
    let filter = UserFilter::try_from(query)?;
    let users = AdminService::new(state.db()).list_users(&filter).await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

// =============================================================================
// Stores
// =============================================================================

/// Store creation form, including the owner account to create with it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoreRequest {
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_password: String,
    pub owner_address: String,
}

#[derive(Debug, Serialize)]
pub struct StoreOwnerView {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedStoreView {
    #[serde(flatten)]
    pub store: StoreView,
    pub owner: StoreOwnerView,
}

#[derive(Debug, Serialize)]
pub struct CreateStoreResponse {
    pub message: &'static str,
    pub store: CreatedStoreView,
}

/// Create a store and its owner account.
///
/// POST /api/admin/stores
pub async fn create_store(
    State(state): State<AppState>,
    RequireCapability(_, _): RequireCapability<ManagePlatform>,
    ApiJson(form): ApiJson<CreateStoreRequest>,
) -> Result<(StatusCode, Json<CreateStoreResponse>)> {
    let store = NewStore {
        name: StoreName::parse(&form.name)?,
        email: Email::parse(&form.email)?,
        address: Address::parse(&form.address)?,
    };
    let owner = UserInput {
        name: PersonName::parse(&form.owner_name)?,
        email: Email::parse(&form.owner_email)?,
        password: Password::parse(&form.owner_password)?,
        address: Address::parse(&form.owner_address)?,
    };

    let (store, owner) = AdminService::new(state.db())
        .create_store(store, owner)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateStoreResponse {
            message: "Store and owner created successfully",
            store: CreatedStoreView {
                store: store.into(),
                owner: StoreOwnerView {
                    id: owner.id,
                    name: owner.name,
                    email: owner.email.into_inner(),
                },
            },
        }),
    ))
}

/// Filtered, sorted store listing.
///
/// GET /api/admin/stores
pub async fn list_stores(
    State(state): State<AppState>,
    RequireCapability(_, _): RequireCapability<ManagePlatform>,
    ApiQuery(query): ApiQuery<StoreListQuery>,
) -> Result<Json<Vec<StoreView>>> {
    let filter = query.into_filter(true)?;
    let stores = AdminService::new(state.db()).list_stores(filter).await?;

    Ok(Json(stores.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_user_query_parses_role_and_sort() {
        let filter = UserFilter::try_from(UserListQuery {
            search: None,
            role: Some("store_owner".to_owned()),
            sort_by: Some("createdAt".to_owned()),
            sort_order: Some("DESC".to_owned()),
        })
        .unwrap();
        assert_eq!(filter.role, Some(Role::StoreOwner));
        assert_eq!(filter.sort_by, UserSortField::CreatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_user_query_blank_role_means_any() {
        let filter = UserFilter::try_from(UserListQuery {
            role: Some(String::new()),
            ..UserListQuery::default()
        })
        .unwrap();
        assert_eq!(filter.role, None);
    }

    #[test]
    fn test_user_query_rejects_unknown_values() {
        let err = UserFilter::try_from(UserListQuery {
            role: Some("superuser".to_owned()),
            ..UserListQuery::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = UserFilter::try_from(UserListQuery {
            sort_by: Some("averageRating".to_owned()),
            ..UserListQuery::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
