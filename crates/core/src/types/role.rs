//! User roles and the capabilities they grant.
//!
//! Authorization is expressed as "does this role hold capability X" rather
//! than comparing role names at each route. Each endpoint names the single
//! [`Capability`] it needs; [`Role::can`] is the only place that decides.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not one of the known roles.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid role: {0} (expected admin, normal, or store_owner)")]
pub struct RoleParseError(pub String);

/// Platform role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Manages users and stores.
    Admin,
    /// Browses stores and submits ratings.
    #[default]
    Normal,
    /// Views ratings for the one store they own.
    StoreOwner,
}

/// An action an endpoint may require of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create users and stores, view platform-wide listings and stats.
    ManagePlatform,
    /// List stores with the caller's own rating and submit ratings.
    RateStores,
    /// View the owned store's aggregate and rating history.
    ViewOwnedStore,
    /// Change the caller's own password.
    ChangeOwnPassword,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Normal, Self::StoreOwner];

    /// Returns whether this role holds `capability`.
    #[must_use]
    pub const fn can(self, capability: Capability) -> bool {
        match capability {
            Capability::ManagePlatform => matches!(self, Self::Admin),
            Capability::RateStores => matches!(self, Self::Normal),
            Capability::ViewOwnedStore => matches!(self, Self::StoreOwner),
            Capability::ChangeOwnPassword => true,
        }
    }

    /// The wire and database name of this role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Normal => "normal",
            Self::StoreOwner => "store_owner",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "normal" => Ok(Self::Normal),
            "store_owner" => Ok(Self::StoreOwner),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
