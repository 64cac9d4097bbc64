//! Search, filter, and sort options for list endpoints.
//!
//! Sort fields are closed enums so that the SQL `ORDER BY` column always
//! comes from [`StoreSortField::column`] / [`UserSortField::column`] and never
//! from the query string.

use store_rating_core::{Role, SortOrder};

/// Error returned for a `sortBy` value the endpoint does not support.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot sort by {0}")]
pub struct SortFieldError(pub String);

/// Sortable store columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreSortField {
    #[default]
    Name,
    Email,
    Address,
    AverageRating,
    TotalRatings,
    CreatedAt,
}

impl StoreSortField {
    /// The `stores` column this field sorts on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::AverageRating => "average_rating",
            Self::TotalRatings => "total_ratings",
            Self::CreatedAt => "created_at",
        }
    }
}

impl std::str::FromStr for StoreSortField {
    type Err = SortFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "averageRating" => Ok(Self::AverageRating),
            "totalRatings" => Ok(Self::TotalRatings),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(SortFieldError(s.to_owned())),
        }
    }
}

/// Sortable user columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSortField {
    #[default]
    Name,
    Email,
    Address,
    Role,
    CreatedAt,
}

impl UserSortField {
    /// The `users` column this field sorts on.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Address => "address",
            Self::Role => "role",
            Self::CreatedAt => "created_at",
        }
    }
}

impl std::str::FromStr for UserSortField {
    type Err = SortFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "address" => Ok(Self::Address),
            "role" => Ok(Self::Role),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(SortFieldError(s.to_owned())),
        }
    }
}

/// Store list options.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    /// Case-insensitive substring to match.
    pub search: Option<String>,
    /// Also match the search term against store emails (admin listing only).
    pub search_email: bool,
    pub sort_by: StoreSortField,
    pub sort_order: SortOrder,
}

/// User list options (admin only).
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring matched against name, email, and address.
    pub search: Option<String>,
    pub role: Option<Role>,
    pub sort_by: UserSortField,
    pub sort_order: SortOrder,
}

/// Normalize a raw search term: trimmed, `None` when blank.
#[must_use]
pub fn normalize_search(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}
