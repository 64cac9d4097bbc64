//! Rating aggregation service.
//!
//! Owns the rules around rating submission and the reads that depend on the
//! stored aggregate. The atomic upsert-and-recompute itself lives in
//! [`RatingLedger::submit`]; this layer maps repository outcomes to domain
//! errors and enforces who may see what.

use thiserror::Error;

use store_rating_core::{RatingValue, StoreId, UserId};

use crate::db::{Database, RatingLedger, RepositoryError, StoreRegistry};
use crate::models::{OwnerDashboard, StoreFilter, StoreWithViewerRating, SubmittedRating};

/// Errors from the rating service.
#[derive(Debug, Error)]
pub enum RatingError {
    /// The rated store does not exist, or the owner has no store.
    #[error("store not found")]
    StoreNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Rating aggregation service.
pub struct RatingService<'a> {
    stores: &'a dyn StoreRegistry,
    ratings: &'a dyn RatingLedger,
}

impl<'a> RatingService<'a> {
    /// Create a rating service over the given repositories.
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self {
            stores: db.stores.as_ref(),
            ratings: db.ratings.as_ref(),
        }
    }

    /// Record `user`'s rating of `store`, overwriting any previous rating
    /// they gave it, and bring the store's aggregate up to date.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::StoreNotFound` if the store does not exist; in
    /// that case nothing is written.
    #[tracing::instrument(skip(self), fields(user_id = %user, store_id = %store))]
    pub async fn submit_rating(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<SubmittedRating, RatingError> {
        let submitted = self
            .ratings
            .submit(user, store, value)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => RatingError::StoreNotFound,
                other => RatingError::Repository(other),
            })?;

        tracing::info!(
            rating = %value,
            updated = submitted.updated,
            average_rating = submitted.aggregate.average_rating,
            total_ratings = submitted.aggregate.total_ratings,
            "rating submitted"
        );

        Ok(submitted)
    }

    /// List stores for a rating user, each annotated with the viewer's own
    /// rating.
    ///
    /// Viewers search name and address only; store emails are not exposed
    /// to them.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::Repository` on storage failure.
    pub async fn list_stores_for_viewer(
        &self,
        viewer: UserId,
        filter: StoreFilter,
    ) -> Result<Vec<StoreWithViewerRating>, RatingError> {
        let filter = StoreFilter {
            search_email: false,
            ..filter
        };
        Ok(self.stores.list_for_viewer(viewer, &filter).await?)
    }

    /// The owner's store with its stored aggregate and every rating it has
    /// received, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::StoreNotFound` if `owner` owns no store.
    pub async fn store_owner_summary(&self, owner: UserId) -> Result<OwnerDashboard, RatingError> {
        let store = self
            .stores
            .get_owned_by(owner)
            .await?
            .ok_or(RatingError::StoreNotFound)?;

        let ratings = self.ratings.list_for_store(store.id).await?;

        Ok(OwnerDashboard { store, ratings })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use store_rating_core::{
        Address, Email, PersonName, RatingAggregate, Role, SortOrder, StoreName,
    };

    use super::*;
    use crate::models::{NewStore, NewUser, Store, StoreSortField, User};

    fn rating(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: PersonName::parse("Rating Service Test User").unwrap(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            address: Address::parse("3 Service Lane").unwrap(),
            role: Role::Normal,
        }
    }

    async fn seed_store(db: &Database, name: &str, email: &str) -> (Store, User) {
        db.stores
            .create_with_owner(
                NewStore {
                    name: StoreName::parse(name).unwrap(),
                    email: Email::parse(email).unwrap(),
                    address: Address::parse("9 Aggregate Avenue").unwrap(),
                },
                new_user(&format!("owner-{email}")),
            )
            .await
            .unwrap()
    }

    async fn seed_user(db: &Database, email: &str) -> User {
        db.users.create(new_user(email)).await.unwrap()
    }

    /// Aggregate as recomputed from the ledger, for comparison with the
    /// stored one.
    async fn recomputed(db: &Database, store: StoreId) -> RatingAggregate {
        let rows = db.ratings.list_for_store(store).await.unwrap();
        RatingAggregate::from_values(rows.iter().map(|r| r.rating.value))
    }

    #[tokio::test]
    async fn test_three_step_scenario() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let (store, _) = seed_store(&db, "Scenario Grocery Store", "scenario@shop.com").await;
        let u1 = seed_user(&db, "u1@example.com").await;
        let u2 = seed_user(&db, "u2@example.com").await;

        let first = service.submit_rating(u1.id, store.id, rating(4)).await.unwrap();
        assert!(!first.updated);
        assert_eq!(first.aggregate.average_rating, 4.0);
        assert_eq!(first.aggregate.total_ratings, 1);

        let second = service.submit_rating(u2.id, store.id, rating(2)).await.unwrap();
        assert!(!second.updated);
        assert_eq!(second.aggregate.average_rating, 3.0);
        assert_eq!(second.aggregate.total_ratings, 2);

        let third = service.submit_rating(u1.id, store.id, rating(5)).await.unwrap();
        assert!(third.updated);
        assert_eq!(third.rating.id, first.rating.id);
        assert_eq!(third.aggregate.average_rating, 3.5);
        assert_eq!(third.aggregate.total_ratings, 2);

        let stored = db.stores.get_by_id(store.id).await.unwrap().unwrap();
        assert_eq!(stored.aggregate, third.aggregate);

        let row = db.ratings.find(u1.id, store.id).await.unwrap().unwrap();
        assert_eq!(row.value, rating(5));
        assert_eq!(row.created_at, first.rating.created_at);
    }

    #[tokio::test]
    async fn test_aggregate_matches_ledger_after_every_submission() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let (store, _) = seed_store(&db, "Consistency Check Market", "consistent@shop.com").await;
        let users = [
            seed_user(&db, "a@example.com").await,
            seed_user(&db, "b@example.com").await,
            seed_user(&db, "c@example.com").await,
        ];

        for (i, value) in [5, 1, 4, 4, 2, 3, 1].into_iter().enumerate() {
            let user = &users[i % users.len()];
            let submitted = service
                .submit_rating(user.id, store.id, rating(value))
                .await
                .unwrap();
            assert_eq!(submitted.aggregate, recomputed(&db, store.id).await);
        }

        // Three users, so never more than three rows regardless of resubmits.
        assert_eq!(db.ratings.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_average_is_rounded_to_hundredths() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let (store, _) = seed_store(&db, "Rounding Rules Boutique", "round@shop.com").await;

        for (i, value) in [1, 1, 2].into_iter().enumerate() {
            let user = seed_user(&db, &format!("r{i}@example.com")).await;
            service.submit_rating(user.id, store.id, rating(value)).await.unwrap();
        }

        let stored = db.stores.get_by_id(store.id).await.unwrap().unwrap();
        assert_eq!(stored.aggregate.average_rating, 1.33);
        assert_eq!(stored.aggregate.total_ratings, 3);
    }

    #[tokio::test]
    async fn test_unknown_store_is_not_found_and_writes_nothing() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let user = seed_user(&db, "lost@example.com").await;

        let err = service
            .submit_rating(user.id, StoreId::new(404), rating(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RatingError::StoreNotFound));
        assert_eq!(db.ratings.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_viewer_annotation() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let (rated, _) = seed_store(&db, "Viewer Rated Store Front", "rated@shop.com").await;
        let (unrated, _) = seed_store(&db, "Viewer Unrated Store Front", "unrated@shop.com").await;
        let viewer = seed_user(&db, "viewer@example.com").await;
        let other = seed_user(&db, "other@example.com").await;

        service.submit_rating(viewer.id, rated.id, rating(3)).await.unwrap();
        service.submit_rating(other.id, unrated.id, rating(5)).await.unwrap();

        let listed = service
            .list_stores_for_viewer(viewer.id, StoreFilter::default())
            .await
            .unwrap();
        let find = |id: StoreId| listed.iter().find(|s| s.store.id == id).unwrap();

        assert_eq!(find(rated.id).user_rating, Some(rating(3)));
        assert_eq!(find(unrated.id).user_rating, None);
        assert_eq!(find(unrated.id).store.aggregate.total_ratings, 1);
    }

    #[tokio::test]
    async fn test_viewer_listing_never_searches_email() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        seed_store(&db, "Hidden Email Hardware", "secret-inbox@shop.com").await;
        let viewer = seed_user(&db, "searcher@example.com").await;

        let filter = StoreFilter {
            search: Some("secret-inbox".to_owned()),
            search_email: true,
            sort_by: StoreSortField::Name,
            sort_order: SortOrder::Asc,
        };
        let listed = service.list_stores_for_viewer(viewer.id, filter).await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_store_owner_summary() {
        let db = Database::in_memory();
        let service = RatingService::new(&db);
        let (store, owner) = seed_store(&db, "Owner Summary Delicatessen", "deli@shop.com").await;
        let rater = seed_user(&db, "rater@example.com").await;
        service.submit_rating(rater.id, store.id, rating(4)).await.unwrap();

        let summary = service.store_owner_summary(owner.id).await.unwrap();
        assert_eq!(summary.store.id, store.id);
        assert_eq!(summary.store.aggregate.total_ratings, 1);
        assert_eq!(summary.ratings.len(), 1);
        assert_eq!(summary.ratings[0].rater_email.as_str(), "rater@example.com");

        let err = service.store_owner_summary(rater.id).await.unwrap_err();
        assert!(matches!(err, RatingError::StoreNotFound));
    }
}
