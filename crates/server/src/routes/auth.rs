//! Registration, login, and password change.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use store_rating_core::{Address, Email, Password, PersonName};

use super::ApiJson;
use super::views::{MessageResponse, UserView};
use crate::error::Result;
use crate::middleware::{ChangeOwnPassword, RequireCapability};
use crate::services::{AuthService, Registration, Session};
use crate::state::AppState;

/// Registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: String,
}

/// Login form.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Password change form.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Successful register/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: &'static str,
    pub token: String,
    pub user: UserView,
}

impl AuthResponse {
    fn new(message: &'static str, session: Session) -> Self {
        Self {
            message,
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Register a new `normal` user.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let registration = Registration {
        name: PersonName::parse(&form.name)?,
        email: Email::parse(&form.email)?,
        password: Password::parse(&form.password)?,
        address: Address::parse(&form.address)?,
    };

    let auth = AuthService::new(state.db().users.as_ref(), state.tokens());
    let session = auth.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User registered successfully", session)),
    ))
}

/// Exchange email and password for a bearer token.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let auth = AuthService::new(state.db().users.as_ref(), state.tokens());
    let session = auth.login(&form.email, &form.password).await?;

    tracing::info!(user_id = %session.user.id, "user logged in");

    Ok(Json(AuthResponse::new("Login successful", session)))
}

/// Change the caller's password.
///
/// PUT /api/auth/password
pub async fn update_password(
    State(state): State<AppState>,
    RequireCapability(user, _): RequireCapability<ChangeOwnPassword>,
    ApiJson(form): ApiJson<UpdatePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let new_password = Password::parse(&form.new_password)?;

    let auth = AuthService::new(state.db().users.as_ref(), state.tokens());
    auth.update_password(user.id, &form.current_password, new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}
