//! Sort direction for list endpoints.

use serde::{Deserialize, Serialize};

/// Error returned for an unrecognized sort direction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid sort order: {0} (expected ASC or DESC)")]
pub struct SortOrderError(pub String);

/// Ascending or descending order.
///
/// Parsing is case-insensitive so `asc`, `ASC`, and `Asc` all work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    /// SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    /// Apply this direction to an ascending comparison result.
    #[must_use]
    pub const fn apply(self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = SortOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(SortOrderError(s.to_owned()))
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = SortOrderError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortOrder> for &'static str {
    fn from(order: SortOrder) -> Self {
        order.as_sql()
    }
}
