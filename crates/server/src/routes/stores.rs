//! Store listing for rating users.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use store_rating_core::{RatingValue, SortOrder, StoreId};

use super::ApiQuery;
use crate::error::Result;
use crate::middleware::{RateStores, RequireCapability};
use crate::models::{
    SortFieldError, StoreFilter, StoreSortField, StoreWithViewerRating, normalize_search,
};
use crate::services::RatingService;
use crate::state::AppState;

/// `?search=&sortBy=&sortOrder=` for store listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListQuery {
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl StoreListQuery {
    /// Parse into a [`StoreFilter`]. Store emails are searchable and
    /// sortable only in the admin view.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` for an unknown `sortBy` or `sortOrder`.
    pub fn into_filter(self, admin_view: bool) -> Result<StoreFilter> {
        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<StoreSortField>)
            .transpose()?
            .unwrap_or_default();
        if sort_by == StoreSortField::Email && !admin_view {
            return Err(SortFieldError("email".to_owned()).into());
        }

        let sort_order = self
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();

        Ok(StoreFilter {
            search: normalize_search(self.search),
            search_email: admin_view,
            sort_by,
            sort_order,
        })
    }
}

/// One row of the viewer's store listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListItem {
    pub id: StoreId,
    pub name: String,
    pub address: String,
    pub average_rating: f64,
    pub total_ratings: i32,
    /// The caller's own rating of this store, if any.
    pub user_rating: Option<RatingValue>,
}

impl From<StoreWithViewerRating> for StoreListItem {
    fn from(item: StoreWithViewerRating) -> Self {
        Self {
            id: item.store.id,
            name: item.store.name,
            address: item.store.address,
            average_rating: item.store.aggregate.average_rating,
            total_ratings: item.store.aggregate.total_ratings,
            user_rating: item.user_rating,
        }
    }
}

/// List stores with the caller's own rating of each.
///
/// GET /api/stores
pub async fn list(
    State(state): State<AppState>,
    RequireCapability(user, _): RequireCapability<RateStores>,
    ApiQuery(query): ApiQuery<StoreListQuery>,
) -> Result<Json<Vec<StoreListItem>>> {
    let filter = query.into_filter(false)?;

    let stores = RatingService::new(state.db())
        .list_stores_for_viewer(user.id, filter)
        .await?;

    Ok(Json(stores.into_iter().map(Into::into).collect()))
}
