//! Domain models for the rating API.
//!
//! These are validated domain objects, separate from the database row types
//! in [`crate::db`] and the JSON view types in [`crate::routes`].

pub mod listing;
pub mod rating;
pub mod store;
pub mod user;

pub use listing::{
    SortFieldError, StoreFilter, StoreSortField, UserFilter, UserSortField, normalize_search,
};
pub use rating::{OwnerDashboard, Rating, RatingWithRater, SubmittedRating};
pub use store::{NewStore, Store, StoreWithViewerRating};
pub use user::{CurrentUser, NewUser, User, UserListing};
