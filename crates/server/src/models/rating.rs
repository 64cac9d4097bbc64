//! Rating domain types.

use chrono::{DateTime, Utc};

use store_rating_core::{Email, RatingAggregate, RatingId, RatingValue, StoreId, UserId};

use super::Store;

/// One user's rating of one store.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    /// Row identity; stable across resubmissions.
    pub id: RatingId,
    pub user_id: UserId,
    pub store_id: StoreId,
    pub value: RatingValue,
    /// First submission time; unchanged by resubmission.
    pub created_at: DateTime<Utc>,
    /// Last submission time.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of a rating submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedRating {
    pub rating: Rating,
    /// `true` when an existing row was overwritten.
    pub updated: bool,
    /// The store's aggregate after this submission.
    pub aggregate: RatingAggregate,
}

/// A rating joined with the rater's public profile, for store owners.
#[derive(Debug, Clone)]
pub struct RatingWithRater {
    pub rating: Rating,
    pub rater_name: String,
    pub rater_email: Email,
}

/// Everything a store owner sees on their dashboard.
#[derive(Debug, Clone)]
pub struct OwnerDashboard {
    pub store: Store,
    /// Newest first.
    pub ratings: Vec<RatingWithRater>,
}
