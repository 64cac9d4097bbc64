//! Rating ledger for `PostgreSQL`.
//!
//! # Submission
//!
//! [`RatingRepository::submit`] runs in a single transaction:
//!
//! 1. `SELECT ... FOR UPDATE` on the store row. Missing store aborts with
//!    `NotFound`; otherwise concurrent submissions for the same store queue
//!    behind the lock.
//! 2. Upsert on `ratings_user_store_key`, so a resubmission overwrites the
//!    value in place and keeps the row's `id` and `created_at`.
//! 3. Recompute `average_rating` / `total_ratings` from every rating row of
//!    the store in one `UPDATE`, and commit.
//!
//! A reader therefore never sees a rating without its aggregate update, or the
//! reverse.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use store_rating_core::{Email, RatingAggregate, RatingId, RatingValue, StoreId, UserId};

use super::{RatingLedger, RepositoryError};
use crate::models::{Rating, RatingWithRater, SubmittedRating};

#[derive(Debug, sqlx::FromRow)]
struct RatingRow {
    id: i32,
    user_id: i32,
    store_id: i32,
    rating: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RatingRow> for Rating {
    type Error = RepositoryError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        let value = RatingValue::try_from(row.rating)
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: RatingId::new(row.id),
            user_id: UserId::new(row.user_id),
            store_id: StoreId::new(row.store_id),
            value,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Upsert result; `inserted` is `xmax = 0`, true only for a fresh row.
#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    inserted: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct AggregateRow {
    average_rating: f64,
    total_ratings: i32,
}

#[derive(Debug, sqlx::FromRow)]
struct RatingWithRaterRow {
    #[sqlx(flatten)]
    rating: RatingRow,
    rater_name: String,
    rater_email: String,
}

/// `PostgreSQL` implementation of [`RatingLedger`].
#[derive(Clone)]
pub struct RatingRepository {
    pool: PgPool,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RatingLedger for RatingRepository {
    async fn find(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let row = sqlx::query_as::<_, RatingRow>(
            r"
            SELECT id, user_id, store_id, rating, created_at, updated_at
            FROM ratings
            WHERE user_id = $1 AND store_id = $2
            ",
        )
        .bind(user)
        .bind(store)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[tracing::instrument(skip(self), fields(user_id = %user, store_id = %store))]
    async fn submit(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<SubmittedRating, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, i32>("SELECT id FROM stores WHERE id = $1 FOR UPDATE")
            .bind(store)
            .fetch_optional(&mut *tx)
            .await?;

        if locked.is_none() {
            // Dropping the transaction rolls it back.
            return Err(RepositoryError::NotFound);
        }

        let upsert = sqlx::query_as::<_, UpsertRow>(
            r"
            INSERT INTO ratings (user_id, store_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT ratings_user_store_key
            DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW()
            RETURNING id, user_id, store_id, rating, created_at, updated_at,
                      (xmax = 0) AS inserted
            ",
        )
        .bind(user)
        .bind(store)
        .bind(i32::from(value))
        .fetch_one(&mut *tx)
        .await?;

        let aggregate = sqlx::query_as::<_, AggregateRow>(
            r"
            UPDATE stores
            SET average_rating = COALESCE(
                    (SELECT ROUND(AVG(rating)::numeric, 2)::float8
                     FROM ratings WHERE store_id = $1),
                    0),
                total_ratings = (SELECT COUNT(*)::int4 FROM ratings WHERE store_id = $1),
                updated_at = NOW()
            WHERE id = $1
            RETURNING average_rating, total_ratings
            ",
        )
        .bind(store)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let updated = !upsert.inserted;
        tracing::debug!(
            updated,
            average_rating = aggregate.average_rating,
            total_ratings = aggregate.total_ratings,
            "rating recorded"
        );

        Ok(SubmittedRating {
            rating: upsert.rating.try_into()?,
            updated,
            aggregate: RatingAggregate {
                average_rating: aggregate.average_rating,
                total_ratings: aggregate.total_ratings,
            },
        })
    }

    async fn list_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let rows = sqlx::query_as::<_, RatingWithRaterRow>(
            r"
            SELECT r.id, r.user_id, r.store_id, r.rating, r.created_at, r.updated_at,
                   u.name AS rater_name, u.email AS rater_email
            FROM ratings r
            JOIN users u ON u.id = r.user_id
            WHERE r.store_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(store)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let rater_email = Email::parse(&row.rater_email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                Ok(RatingWithRater {
                    rating: row.rating.try_into()?,
                    rater_name: row.rater_name,
                    rater_email,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
