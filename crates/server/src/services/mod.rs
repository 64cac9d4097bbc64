//! Business logic services.

pub mod admin;
pub mod auth;
pub mod ratings;

pub use admin::{AdminError, AdminService, DashboardStats, UserInput};
pub use auth::{AuthError, AuthService, Registration, Session};
pub use ratings::{RatingError, RatingService};
