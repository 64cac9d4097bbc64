//! Store repository for `PostgreSQL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_rating_core::{Email, RatingAggregate, RatingValue, Role, StoreId, UserId};

use super::users::{USER_COLUMNS, UserRow};
use super::{RepositoryError, StoreRegistry, like_pattern, map_unique_violation};
use crate::models::{NewStore, NewUser, Store, StoreFilter, StoreWithViewerRating, User};

const STORE_COLUMNS: &str = "s.id, s.name, s.email, s.address, s.average_rating, \
     s.total_ratings, s.created_at, s.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    name: String,
    email: String,
    address: String,
    average_rating: f64,
    total_ratings: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid store email in database: {e}"))
        })?;

        Ok(Self {
            id: StoreId::new(row.id),
            name: row.name,
            email,
            address: row.address,
            aggregate: RatingAggregate {
                average_rating: row.average_rating,
                total_ratings: row.total_ratings,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreWithViewerRow {
    #[sqlx(flatten)]
    store: StoreRow,
    user_rating: Option<i32>,
}

impl TryFrom<StoreWithViewerRow> for StoreWithViewerRating {
    type Error = RepositoryError;

    fn try_from(row: StoreWithViewerRow) -> Result<Self, Self::Error> {
        let user_rating = row
            .user_rating
            .map(RatingValue::try_from)
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            store: row.store.try_into()?,
            user_rating,
        })
    }
}

/// `WHERE` clause shared by both listings; `$1` is the `ILIKE` pattern.
const fn search_clause(search_email: bool) -> &'static str {
    if search_email {
        "($1::text IS NULL OR s.name ILIKE $1 OR s.email ILIKE $1 OR s.address ILIKE $1)"
    } else {
        "($1::text IS NULL OR s.name ILIKE $1 OR s.address ILIKE $1)"
    }
}

/// `PostgreSQL` implementation of [`StoreRegistry`].
#[derive(Clone)]
pub struct StoreRepository {
    pool: PgPool,
}

impl StoreRepository {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StoreRegistry for StoreRepository {
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores s WHERE s.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores s WHERE s.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get_owned_by(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores s
            JOIN users u ON u.owned_store_id = s.id
            WHERE u.id = $1
            "
        ))
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_with_owner(
        &self,
        store: NewStore,
        owner: NewUser,
    ) -> Result<(Store, User), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let store_row = sqlx::query_as::<_, StoreRow>(&format!(
            r"
            INSERT INTO stores AS s (name, email, address)
            VALUES ($1, $2, $3)
            RETURNING {STORE_COLUMNS}
            "
        ))
        .bind(store.name.as_str())
        .bind(&store.email)
        .bind(store.address.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let store: Store = store_row.try_into()?;

        let owner_row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, password_hash, address, role, owned_store_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(owner.name.as_str())
        .bind(&owner.email)
        .bind(&owner.password_hash)
        .bind(owner.address.as_str())
        .bind(Role::StoreOwner)
        .bind(store.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        let owner: User = owner_row.try_into()?;

        tx.commit().await?;

        Ok((store, owner))
    }

    async fn list(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}
            FROM stores s
            WHERE {search}
            ORDER BY s.{column} {direction}, s.id ASC
            ",
            search = search_clause(filter.search_email),
            column = filter.sort_by.column(),
            direction = filter.sort_order.as_sql(),
        );

        let rows = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(filter.search.as_deref().map(like_pattern))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list_for_viewer(
        &self,
        viewer: UserId,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithViewerRating>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {STORE_COLUMNS}, r.rating AS user_rating
            FROM stores s
            LEFT JOIN ratings r ON r.store_id = s.id AND r.user_id = $2
            WHERE {search}
            ORDER BY s.{column} {direction}, s.id ASC
            ",
            search = search_clause(filter.search_email),
            column = filter.sort_by.column(),
            direction = filter.sort_order.as_sql(),
        );

        let rows = sqlx::query_as::<_, StoreWithViewerRow>(&sql)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(viewer)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
