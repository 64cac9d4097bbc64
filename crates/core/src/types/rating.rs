//! Rating values and the per-store aggregate derived from them.

use serde::{Deserialize, Serialize};

/// Error returned when a rating is outside the accepted star range.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be an integer between {min} and {max}, got {value}", min = RatingValue::MIN, max = RatingValue::MAX)]
pub struct RatingValueError {
    /// The rejected value.
    pub value: i64,
}

/// A star rating in `1..=5`.
///
/// ```
/// use store_rating_core::RatingValue;
///
/// assert_eq!(RatingValue::new(4).unwrap().get(), 4);
/// assert!(RatingValue::new(0).is_err());
/// assert!(RatingValue::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Parse a rating from any integer.
    ///
    /// # Errors
    ///
    /// Returns [`RatingValueError`] if `value` is not in `1..=5`.
    pub fn new(value: i64) -> Result<Self, RatingValueError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingValueError { value })
    }

    /// The rating as a plain integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i32> for RatingValue {
    type Error = RatingValueError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<RatingValue> for i32 {
    fn from(value: RatingValue) -> Self {
        Self::from(value.0)
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The derived `(averageRating, totalRatings)` pair stored on a store.
///
/// Always the mean of every rating row for the store rounded to two decimal
/// places, and the number of those rows. A store with no ratings has
/// `0.0 / 0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    /// Mean rating, rounded to hundredths.
    pub average_rating: f64,
    /// Number of rating rows.
    pub total_ratings: i32,
}

impl RatingAggregate {
    /// Compute the aggregate from the complete set of a store's ratings.
    ///
    /// ```
    /// use store_rating_core::{RatingAggregate, RatingValue};
    ///
    /// let values = [4, 2, 5].map(|v| RatingValue::new(v).unwrap());
    /// let aggregate = RatingAggregate::from_values(values);
    /// assert_eq!(aggregate.average_rating, 3.67);
    /// assert_eq!(aggregate.total_ratings, 3);
    /// ```
    #[must_use]
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = RatingValue>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0_u64, 0_u64), |(sum, count), v| {
                (sum + u64::from(v.get()), count + 1)
            });

        if count == 0 {
            return Self::default();
        }

        Self {
            average_rating: mean_in_hundredths(sum, count),
            total_ratings: i32::try_from(count).unwrap_or(i32::MAX),
        }
    }
}

/// `sum / count` rounded to two decimal places, halves away from zero.
///
/// Rounds in integer arithmetic so the result matches
/// `ROUND(AVG(rating), 2)` in `PostgreSQL` exactly, including means that sit
/// on a `.xx5` boundary.
fn mean_in_hundredths(sum: u64, count: u64) -> f64 {
    let hundredths = (sum * 200 + count) / (2 * count);
    #[allow(clippy::cast_precision_loss)]
    let hundredths = hundredths as f64;
    hundredths / 100.0
}
