//! User repository for `PostgreSQL`.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database; row types convert into domain types via `TryFrom`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_rating_core::{Email, Role, StoreId, UserId};

use super::{RepositoryError, UserStore, like_pattern, map_unique_violation};
use crate::models::{NewUser, User, UserFilter, UserListing};

// =============================================================================
// Internal Row Types
// =============================================================================

pub(super) const USER_COLUMNS: &str =
    "id, name, email, address, role, owned_store_id, created_at, updated_at";

/// Internal row type for user queries.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct UserRow {
    id: i32,
    name: String,
    email: String,
    address: String,
    role: Role,
    owned_store_id: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            address: row.address,
            role: row.role,
            owned_store_id: row.owned_store_id.map(StoreId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// User row plus password hash, for login.
#[derive(Debug, sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// User row plus the owned store's average, for the admin listing.
#[derive(Debug, sqlx::FromRow)]
struct UserListingRow {
    #[sqlx(flatten)]
    user: UserRow,
    store_rating: Option<f64>,
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL` implementation of [`UserStore`].
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithHashRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some((r.user.try_into()?, r.password_hash))),
            None => Ok(None),
        }
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hash)
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, password_hash, address, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(user.name.as_str())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.address.as_str())
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserListing>, RepositoryError> {
        // Column and direction come from closed enums, never from user input.
        let sql = format!(
            r"
            SELECT u.id, u.name, u.email, u.address, u.role, u.owned_store_id,
                   u.created_at, u.updated_at,
                   s.average_rating AS store_rating
            FROM users u
            LEFT JOIN stores s ON s.id = u.owned_store_id
            WHERE ($1::text IS NULL
                   OR u.name ILIKE $1 OR u.email ILIKE $1 OR u.address ILIKE $1)
              AND ($2::user_role IS NULL OR u.role = $2)
            ORDER BY u.{column} {direction}, u.id ASC
            ",
            column = filter.sort_by.column(),
            direction = filter.sort_order.as_sql(),
        );

        let rows = sqlx::query_as::<_, UserListingRow>(&sql)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.role)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|r| {
                Ok(UserListing {
                    user: r.user.try_into()?,
                    store_rating: r.store_rating,
                })
            })
            .collect()
    }

    async fn count_non_admin(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role <> 'admin'")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
