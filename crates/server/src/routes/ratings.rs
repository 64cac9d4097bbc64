//! Rating submission.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use store_rating_core::{RatingAggregate, RatingValue, StoreId};

use super::ApiJson;
use super::views::RatingView;
use crate::error::{AppError, Result};
use crate::middleware::{RateStores, RequireCapability};
use crate::services::RatingService;
use crate::state::AppState;

/// Rating submission form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingRequest {
    pub store_id: StoreId,
    pub rating: RatingInput,
}

/// A rating as clients send it: a JSON integer, an integral number such as
/// `4.0`, or a decimal string such as `"4"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RatingInput {
    Integer(i64),
    Number(f64),
    Text(String),
}

impl TryFrom<RatingInput> for RatingValue {
    type Error = AppError;

    fn try_from(input: RatingInput) -> Result<Self> {
        let value = match input {
            RatingInput::Integer(v) => v,
            RatingInput::Number(v) => integral(v).ok_or_else(not_an_integer)?,
            RatingInput::Text(raw) => raw.parse::<i64>().map_err(|_| not_an_integer())?,
        };
        Ok(Self::new(value)?)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integral(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && (-1e15..=1e15).contains(&v)).then_some(v as i64)
}

fn not_an_integer() -> AppError {
    AppError::Validation(format!(
        "rating must be an integer between {} and {}",
        RatingValue::MIN,
        RatingValue::MAX
    ))
}

/// Rating submission result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRatingResponse {
    pub message: &'static str,
    pub rating: RatingView,
    /// The store's aggregate after this submission.
    pub store: RatingAggregate,
}

/// Submit, or overwrite, the caller's rating of a store.
///
/// POST /api/ratings
pub async fn submit(
    State(state): State<AppState>,
    RequireCapability(user, _): RequireCapability<RateStores>,
    ApiJson(form): ApiJson<SubmitRatingRequest>,
) -> Result<Json<SubmitRatingResponse>> {
    let value = RatingValue::try_from(form.rating)?;

    let submitted = RatingService::new(state.db())
        .submit_rating(user.id, form.store_id, value)
        .await?;

    let message = if submitted.updated {
        "Rating updated successfully"
    } else {
        "Rating submitted successfully"
    };

    Ok(Json(SubmitRatingResponse {
        message,
        rating: submitted.rating.into(),
        store: submitted.aggregate,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<RatingValue> {
        let form: SubmitRatingRequest = serde_json::from_str(body).unwrap();
        RatingValue::try_from(form.rating)
    }

    #[test]
    fn test_integer_like_ratings_are_accepted() {
        for body in [
            r#"{"storeId": 1, "rating": 4}"#,
            r#"{"storeId": 1, "rating": 4.0}"#,
            r#"{"storeId": 1, "rating": "4"}"#,
        ] {
            assert_eq!(parse(body).unwrap().get(), 4, "{body}");
        }
    }

    #[test]
    fn test_non_integer_or_out_of_range_ratings_are_rejected() {
        for body in [
            r#"{"storeId": 1, "rating": 4.5}"#,
            r#"{"storeId": 1, "rating": "four"}"#,
            r#"{"storeId": 1, "rating": "4.0"}"#,
            r#"{"storeId": 1, "rating": 6}"#,
            r#"{"storeId": 1, "rating": "0"}"#,
        ] {
            assert!(
                matches!(parse(body), Err(AppError::Validation(_))),
                "{body}"
            );
        }
    }
}
