//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Responses carry a JSON body
//! `{"message": "..."}`; server-side failures are captured to Sentry and
//! answered with a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use store_rating_core::{EmailError, PasswordError, RatingValueError, TextError};

use crate::db::RepositoryError;
use crate::models::SortFieldError;
use crate::services::{AdminError, AuthError, RatingError};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Rating operation failed.
    #[error("Rating error: {0}")]
    Rating(#[from] RatingError),

    /// Admin operation failed.
    #[error("Admin error: {0}")]
    Admin(#[from] AdminError),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but the role lacks the capability.
    #[error("{0}")]
    Forbidden(String),

    /// Rate limited.
    #[error("Too many requests")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    /// Whether this error is the server's fault rather than the client's.
    const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(
                    AuthError::Repository(_) | AuthError::PasswordHash
                )
                | Self::Rating(RatingError::Repository(_))
                | Self::Admin(AdminError::Repository(_) | AdminError::Auth(_))
        )
    }

    fn status(&self) -> StatusCode {
        if self.is_internal() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Rating(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Admin(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        if self.is_internal() {
            return INTERNAL_MESSAGE.to_owned();
        }
        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials",
                AuthError::IncorrectCurrentPassword => "Current password is incorrect",
                AuthError::UserNotFound => "User not found",
                AuthError::UserAlreadyExists => "User already exists with this email",
                AuthError::InvalidToken(_) => "Invalid or expired token",
                AuthError::Repository(_) | AuthError::PasswordHash => INTERNAL_MESSAGE,
            }
            .to_owned(),
            Self::Rating(_) => "Store not found".to_owned(),
            Self::Admin(err) => match err {
                AdminError::StoreEmailTaken => "Store already exists with this email",
                AdminError::UserEmailTaken => "User already exists with this email",
                AdminError::Auth(_) | AdminError::Repository(_) => INTERNAL_MESSAGE,
            }
            .to_owned(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = ErrorBody {
            message: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

macro_rules! validation_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    Self::Validation(err.to_string())
                }
            }
        )+
    };
}

validation_from!(
    EmailError,
    TextError,
    PasswordError,
    RatingValueError,
    SortFieldError,
    store_rating_core::SortOrderError,
    store_rating_core::RoleParseError,
);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Set the Sentry user context from a user ID.
///
/// Called once a bearer token has been verified so errors are associated
/// with the caller.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
