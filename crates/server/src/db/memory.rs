//! In-memory backend.
//!
//! Implements all three repository traits over one mutex-guarded state, so
//! every operation (including a rating submission with its aggregate
//! recomputation) is applied atomically. Used by the unit and integration
//! test suites.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use store_rating_core::{Email, RatingAggregate, RatingId, RatingValue, Role, StoreId, UserId};

use super::{RatingLedger, RepositoryError, StoreRegistry, UserStore};
use crate::models::{
    NewStore, NewUser, Rating, RatingWithRater, Store, StoreFilter, StoreSortField,
    StoreWithViewerRating, SubmittedRating, User, UserFilter, UserListing, UserSortField,
};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, StoredUser>,
    stores: BTreeMap<StoreId, Store>,
    ratings: BTreeMap<(UserId, StoreId), Rating>,
    next_user_id: i32,
    next_store_id: i32,
    next_rating_id: i32,
}

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
}

impl State {
    fn next_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        UserId::new(self.next_user_id)
    }

    fn next_store_id(&mut self) -> StoreId {
        self.next_store_id += 1;
        StoreId::new(self.next_store_id)
    }

    fn next_rating_id(&mut self) -> RatingId {
        self.next_rating_id += 1;
        RatingId::new(self.next_rating_id)
    }

    fn user_email_taken(&self, email: &Email) -> bool {
        self.users.values().any(|u| &u.user.email == email)
    }

    fn store_email_taken(&self, email: &Email) -> bool {
        self.stores.values().any(|s| &s.email == email)
    }

    fn insert_user(&mut self, new: NewUser, owned_store_id: Option<StoreId>) -> User {
        let now = Utc::now();
        let user = User {
            id: self.next_user_id(),
            name: new.name.into_inner(),
            email: new.email,
            address: new.address.into_inner(),
            role: new.role,
            owned_store_id,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: new.password_hash,
            },
        );
        user
    }

    fn owned_store(&self, owner: UserId) -> Option<&Store> {
        let store_id = self.users.get(&owner)?.user.owned_store_id?;
        self.stores.get(&store_id)
    }

    fn recompute(&mut self, store: StoreId) -> RatingAggregate {
        let aggregate = RatingAggregate::from_values(
            self.ratings
                .values()
                .filter(|r| r.store_id == store)
                .map(|r| r.value),
        );
        if let Some(entry) = self.stores.get_mut(&store) {
            entry.aggregate = aggregate;
            entry.updated_at = Utc::now();
        }
        aggregate
    }

    fn filtered_stores(&self, filter: &StoreFilter) -> Vec<Store> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut stores: Vec<Store> = self
            .stores
            .values()
            .filter(|s| {
                needle.as_deref().is_none_or(|n| {
                    contains_ci(&s.name, n)
                        || contains_ci(&s.address, n)
                        || (filter.search_email && contains_ci(s.email.as_str(), n))
                })
            })
            .cloned()
            .collect();

        stores.sort_by(|a, b| {
            filter
                .sort_order
                .apply(compare_stores(a, b, filter.sort_by))
                .then(a.id.cmp(&b.id))
        });
        stores
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

fn compare_stores(a: &Store, b: &Store, field: StoreSortField) -> Ordering {
    match field {
        StoreSortField::Name => a.name.cmp(&b.name),
        StoreSortField::Email => a.email.as_str().cmp(b.email.as_str()),
        StoreSortField::Address => a.address.cmp(&b.address),
        StoreSortField::AverageRating => a
            .aggregate
            .average_rating
            .total_cmp(&b.aggregate.average_rating),
        StoreSortField::TotalRatings => a.aggregate.total_ratings.cmp(&b.aggregate.total_ratings),
        StoreSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Position of the role in the `user_role` enum, which is how `PostgreSQL`
/// orders enum values.
fn role_rank(role: Role) -> usize {
    Role::ALL.iter().position(|r| *r == role).unwrap_or(usize::MAX)
}

fn compare_users(a: &User, b: &User, field: UserSortField) -> Ordering {
    match field {
        UserSortField::Name => a.name.cmp(&b.name),
        UserSortField::Email => a.email.as_str().cmp(b.email.as_str()),
        UserSortField::Address => a.address.cmp(&b.address),
        UserSortField::Role => role_rank(a.role).cmp(&role_rank(b.role)),
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

/// Repository backend that keeps everything in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| u.user.clone()))
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| u.user.clone()))
    }

    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| &u.user.email == email)
            .map(|u| (u.user.clone(), u.password_hash.clone())))
    }

    async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|u| u.password_hash.clone()))
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.user_email_taken(&user.email) {
            return Err(RepositoryError::Conflict(
                "user email already exists".to_owned(),
            ));
        }
        Ok(state.insert_user(user, None))
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let entry = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        password_hash.clone_into(&mut entry.password_hash);
        entry.user.updated_at = Utc::now();
        Ok(())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserListing>, RepositoryError> {
        let state = self.state.lock().await;
        let needle = filter.search.as_deref().map(str::to_lowercase);

        let mut users: Vec<UserListing> = state
            .users
            .values()
            .map(|u| &u.user)
            .filter(|u| filter.role.is_none_or(|role| u.role == role))
            .filter(|u| {
                needle.as_deref().is_none_or(|n| {
                    contains_ci(&u.name, n)
                        || contains_ci(u.email.as_str(), n)
                        || contains_ci(&u.address, n)
                })
            })
            .map(|u| UserListing {
                user: u.clone(),
                store_rating: state.owned_store(u.id).map(|s| s.aggregate.average_rating),
            })
            .collect();

        users.sort_by(|a, b| {
            filter
                .sort_order
                .apply(compare_users(&a.user, &b.user, filter.sort_by))
                .then(a.user.id.cmp(&b.user.id))
        });
        Ok(users)
    }

    async fn count_non_admin(&self) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        let count = state
            .users
            .values()
            .filter(|u| u.user.role != Role::Admin)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl StoreRegistry for MemoryBackend {
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.stores.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &Email) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.stores.values().find(|s| &s.email == email).cloned())
    }

    async fn get_owned_by(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.owned_store(owner).cloned())
    }

    async fn create_with_owner(
        &self,
        store: NewStore,
        owner: NewUser,
    ) -> Result<(Store, User), RepositoryError> {
        let mut state = self.state.lock().await;

        // Check both constraints before writing so a failure leaves no trace.
        if state.store_email_taken(&store.email) {
            return Err(RepositoryError::Conflict(
                "store email already exists".to_owned(),
            ));
        }
        if state.user_email_taken(&owner.email) {
            return Err(RepositoryError::Conflict(
                "user email already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let created = Store {
            id: state.next_store_id(),
            name: store.name.into_inner(),
            email: store.email,
            address: store.address.into_inner(),
            aggregate: RatingAggregate::default(),
            created_at: now,
            updated_at: now,
        };
        state.stores.insert(created.id, created.clone());

        let owner = state.insert_user(
            NewUser {
                role: Role::StoreOwner,
                ..owner
            },
            Some(created.id),
        );

        Ok((created, owner))
    }

    async fn list(&self, filter: &StoreFilter) -> Result<Vec<Store>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.filtered_stores(filter))
    }

    async fn list_for_viewer(
        &self,
        viewer: UserId,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreWithViewerRating>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .filtered_stores(filter)
            .into_iter()
            .map(|store| {
                let user_rating = state.ratings.get(&(viewer, store.id)).map(|r| r.value);
                StoreWithViewerRating { store, user_rating }
            })
            .collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(i64::try_from(state.stores.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl RatingLedger for MemoryBackend {
    async fn find(
        &self,
        user: UserId,
        store: StoreId,
    ) -> Result<Option<Rating>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.ratings.get(&(user, store)).cloned())
    }

    async fn submit(
        &self,
        user: UserId,
        store: StoreId,
        value: RatingValue,
    ) -> Result<SubmittedRating, RepositoryError> {
        let mut state = self.state.lock().await;

        if !state.stores.contains_key(&store) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        let (rating, updated) = if let Some(existing) = state.ratings.get_mut(&(user, store)) {
            existing.value = value;
            existing.updated_at = now;
            (existing.clone(), true)
        } else {
            let rating = Rating {
                id: state.next_rating_id(),
                user_id: user,
                store_id: store,
                value,
                created_at: now,
                updated_at: now,
            };
            state.ratings.insert((user, store), rating.clone());
            (rating, false)
        };

        let aggregate = state.recompute(store);

        Ok(SubmittedRating {
            rating,
            updated,
            aggregate,
        })
    }

    async fn list_for_store(
        &self,
        store: StoreId,
    ) -> Result<Vec<RatingWithRater>, RepositoryError> {
        let state = self.state.lock().await;
        let mut ratings: Vec<RatingWithRater> = state
            .ratings
            .values()
            .filter(|r| r.store_id == store)
            .filter_map(|r| {
                let rater = &state.users.get(&r.user_id)?.user;
                Some(RatingWithRater {
                    rating: r.clone(),
                    rater_name: rater.name.clone(),
                    rater_email: rater.email.clone(),
                })
            })
            .collect();

        ratings.sort_by(|a, b| {
            b.rating
                .created_at
                .cmp(&a.rating.created_at)
                .then(b.rating.id.cmp(&a.rating.id))
        });
        Ok(ratings)
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(i64::try_from(state.ratings.len()).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use store_rating_core::{Address, PersonName, SortOrder, StoreName};

    use super::*;

    fn new_user(email: &str, role: Role) -> NewUser {
        NewUser {
            name: PersonName::parse("Reviewer With A Long Name").unwrap(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            address: Address::parse("1 Test Street").unwrap(),
            role,
        }
    }

    fn new_store(name: &str, email: &str) -> NewStore {
        NewStore {
            name: StoreName::parse(name).unwrap(),
            email: Email::parse(email).unwrap(),
            address: Address::parse("42 Market Road").unwrap(),
        }
    }

    async fn seed_store(backend: &MemoryBackend, name: &str, email: &str) -> Store {
        let owner_email = format!("owner.{email}");
        backend
            .create_with_owner(new_store(name, email), new_user(&owner_email, Role::Normal))
            .await
            .unwrap()
            .0
    }

    fn rating(v: i64) -> RatingValue {
        RatingValue::new(v).unwrap()
    }

    #[tokio::test]
    async fn test_submit_inserts_then_overwrites() {
        let backend = MemoryBackend::new();
        let store = seed_store(&backend, "Corner Grocery Store Ltd", "shop@a.com").await;
        let user = UserStore::create(&backend, new_user("u@a.com", Role::Normal))
            .await
            .unwrap();

        let first = backend.submit(user.id, store.id, rating(4)).await.unwrap();
        assert!(!first.updated);
        assert_eq!(first.aggregate.total_ratings, 1);

        let second = backend.submit(user.id, store.id, rating(2)).await.unwrap();
        assert!(second.updated);
        assert_eq!(second.rating.id, first.rating.id);
        assert_eq!(second.rating.created_at, first.rating.created_at);
        assert_eq!(second.aggregate.average_rating, 2.0);
        assert_eq!(second.aggregate.total_ratings, 1);
        assert_eq!(RatingLedger::count(&backend).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_submit_unknown_store_writes_nothing() {
        let backend = MemoryBackend::new();
        let err = backend
            .submit(UserId::new(1), StoreId::new(99), rating(3))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert_eq!(RatingLedger::count(&backend).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_submissions_keep_aggregate_consistent() {
        let backend = MemoryBackend::new();
        let store = seed_store(&backend, "Concurrent Corner Market", "busy@a.com").await;

        let mut handles = Vec::new();
        for i in 0..20_i32 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                let value = rating(i64::from(i % 5 + 1));
                backend.submit(UserId::new(1000 + i), store.id, value).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = StoreRegistry::get_by_id(&backend, store.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.aggregate.total_ratings, 20);
        assert_eq!(stored.aggregate.average_rating, 3.0);
    }

    #[tokio::test]
    async fn test_create_with_owner_links_owner_and_is_atomic() {
        let backend = MemoryBackend::new();
        let (store, owner) = backend
            .create_with_owner(
                new_store("Linked Owner Store Front", "linked@a.com"),
                new_user("boss@a.com", Role::Normal),
            )
            .await
            .unwrap();
        assert_eq!(owner.role, Role::StoreOwner);
        assert_eq!(owner.owned_store_id, Some(store.id));
        assert_eq!(
            backend.get_owned_by(owner.id).await.unwrap().unwrap().id,
            store.id
        );

        // Owner email clash: no store may be left behind.
        let err = backend
            .create_with_owner(
                new_store("Another Store Front Shop", "other@a.com"),
                new_user("boss@a.com", Role::Normal),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(StoreRegistry::count(&backend).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_for_viewer_search_and_sort() {
        let backend = MemoryBackend::new();
        let a = seed_store(&backend, "Alpha Hardware Emporium", "alpha@a.com").await;
        let b = seed_store(&backend, "Beta Bakery And Coffee", "beta@a.com").await;
        backend.submit(UserId::new(50), a.id, rating(2)).await.unwrap();
        backend.submit(UserId::new(51), b.id, rating(5)).await.unwrap();

        let filter = StoreFilter {
            sort_by: StoreSortField::AverageRating,
            sort_order: SortOrder::Desc,
            ..StoreFilter::default()
        };
        let listed = backend.list_for_viewer(UserId::new(50), &filter).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].store.id, b.id);
        assert_eq!(listed[0].user_rating, None);
        assert_eq!(listed[1].user_rating, Some(rating(2)));

        let filter = StoreFilter {
            search: Some("bakery".to_owned()),
            ..StoreFilter::default()
        };
        let listed = backend.list_for_viewer(UserId::new(50), &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].store.id, b.id);

        // Email is only searched when asked for.
        let filter = StoreFilter {
            search: Some("alpha@".to_owned()),
            ..StoreFilter::default()
        };
        assert!(backend.list_for_viewer(UserId::new(50), &filter).await.unwrap().is_empty());
        let filter = StoreFilter {
            search_email: true,
            ..filter
        };
        assert_eq!(StoreRegistry::list(&backend, &filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_user_listing_includes_owned_store_rating() {
        let backend = MemoryBackend::new();
        let (store, owner) = backend
            .create_with_owner(
                new_store("Rated Store For Listing", "rated@a.com"),
                new_user("owner@a.com", Role::Normal),
            )
            .await
            .unwrap();
        backend.submit(UserId::new(77), store.id, rating(4)).await.unwrap();
        UserStore::create(&backend, new_user("plain@a.com", Role::Normal))
            .await
            .unwrap();

        let filter = UserFilter {
            role: Some(Role::StoreOwner),
            ..UserFilter::default()
        };
        let listed = UserStore::list(&backend, &filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user.id, owner.id);
        assert_eq!(listed[0].store_rating, Some(4.0));
        assert_eq!(backend.count_non_admin().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_for_store_is_newest_first() {
        let backend = MemoryBackend::new();
        let store = seed_store(&backend, "History Of Ratings Shop", "hist@a.com").await;
        let first = UserStore::create(&backend, new_user("first@a.com", Role::Normal))
            .await
            .unwrap();
        let second = UserStore::create(&backend, new_user("second@a.com", Role::Normal))
            .await
            .unwrap();
        backend.submit(first.id, store.id, rating(1)).await.unwrap();
        backend.submit(second.id, store.id, rating(5)).await.unwrap();

        let history = backend.list_for_store(store.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].rating.user_id, second.id);
        assert_eq!(history[1].rater_email.as_str(), "first@a.com");
    }

    #[tokio::test]
    async fn test_duplicate_user_email_conflicts() {
        let backend = MemoryBackend::new();
        UserStore::create(&backend, new_user("dup@a.com", Role::Normal))
            .await
            .unwrap();
        let err = UserStore::create(&backend, new_user("DUP@a.com", Role::Normal))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
