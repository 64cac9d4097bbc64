//! Store owner dashboard.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

use store_rating_core::{RatingId, RatingValue, StoreId};

use crate::error::Result;
use crate::middleware::{RequireCapability, ViewOwnedStore};
use crate::models::{OwnerDashboard, RatingWithRater};
use crate::services::RatingService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoreSummary {
    pub id: StoreId,
    pub name: String,
    pub average_rating: f64,
    pub total_ratings: i32,
}

#[derive(Debug, Serialize)]
pub struct Rater {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedRating {
    pub id: RatingId,
    pub rating: RatingValue,
    pub created_at: DateTime<Utc>,
    pub user: Rater,
}

impl From<RatingWithRater> for ReceivedRating {
    fn from(item: RatingWithRater) -> Self {
        Self {
            id: item.rating.id,
            rating: item.rating.value,
            created_at: item.rating.created_at,
            user: Rater {
                name: item.rater_name,
                email: item.rater_email.into_inner(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OwnerDashboardResponse {
    pub store: OwnedStoreSummary,
    /// Newest first.
    pub ratings: Vec<ReceivedRating>,
}

impl From<OwnerDashboard> for OwnerDashboardResponse {
    fn from(dashboard: OwnerDashboard) -> Self {
        let store = dashboard.store;
        Self {
            store: OwnedStoreSummary {
                id: store.id,
                name: store.name,
                average_rating: store.aggregate.average_rating,
                total_ratings: store.aggregate.total_ratings,
            },
            ratings: dashboard.ratings.into_iter().map(Into::into).collect(),
        }
    }
}

/// The caller's store aggregate and every rating it has received.
///
/// GET /api/store-owner/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    RequireCapability(user, _): RequireCapability<ViewOwnedStore>,
) -> Result<Json<OwnerDashboardResponse>> {
    let summary = RatingService::new(state.db())
        .store_owner_summary(user.id)
        .await?;

    Ok(Json(summary.into()))
}
