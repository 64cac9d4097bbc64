//! Bearer token authentication and capability extractors.
//!
//! Handlers declare what they need in their signature:
//!
//! ```rust,ignore
//! async fn submit(
//!     RequireCapability(user, _): RequireCapability<RateStores>,
//!     ApiJson(body): ApiJson<SubmitRatingRequest>,
//! ) -> Result<Json<SubmitRatingResponse>> { ... }
//! ```
//!
//! The token is verified and the user is re-read from the credential store,
//! so a role change or removed account takes effect before the token expires.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::Span;

use store_rating_core::Capability;

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Rejection for the authentication extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Token failed verification or names an unknown user.
    InvalidToken,
    /// Authenticated, but the role lacks the required capability.
    Forbidden,
    /// Lookup failed.
    Internal(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingToken => {
                AppError::Unauthorized("Access token required".to_owned()).into_response()
            }
            Self::InvalidToken => {
                AppError::Unauthorized("Invalid or expired token".to_owned()).into_response()
            }
            Self::Forbidden => AppError::Forbidden("Access denied".to_owned()).into_response(),
            Self::Internal(err) => err.into_response(),
        }
    }
}

/// Extractor that requires a valid bearer token.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|_| AuthRejection::InvalidToken)?;

        let user = state
            .db()
            .users
            .get_by_id(claims.sub)
            .await
            .map_err(|e| AuthRejection::Internal(e.into()))?
            .ok_or(AuthRejection::InvalidToken)?;

        Span::current().record("user_id", user.id.as_i32());
        set_sentry_user(&user.id);

        Ok(Self(CurrentUser {
            id: user.id,
            role: user.role,
        }))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Type-level name of a [`Capability`], for use with [`RequireCapability`].
pub trait RequiredCapability {
    const CAPABILITY: Capability;
}

macro_rules! capability_marker {
    ($($name:ident),+ $(,)?) => {
        $(
            #[doc = concat!("Marker for [`Capability::", stringify!($name), "`].")]
            pub struct $name;

            impl RequiredCapability for $name {
                const CAPABILITY: Capability = Capability::$name;
            }
        )+
    };
}

capability_marker!(ManagePlatform, RateStores, ViewOwnedStore, ChangeOwnPassword);

/// Extractor that requires a valid bearer token whose role holds `C`.
///
/// Rejects with 401 when unauthenticated and 403 when the role lacks the
/// capability.
pub struct RequireCapability<C>(pub CurrentUser, pub PhantomData<C>);

impl<C> FromRequestParts<AppState> for RequireCapability<C>
where
    C: RequiredCapability + Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.role.can(C::CAPABILITY) {
            tracing::debug!(
                user_id = %user.id,
                role = %user.role,
                capability = ?C::CAPABILITY,
                "capability denied"
            );
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user, PhantomData))
    }
}
