//! Authentication service.
//!
//! Password registration and login, password changes, and bearer token
//! issue/verification.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TOKEN_TTL, TokenKeys};

use store_rating_core::{Address, Email, Password, PersonName, Role, UserId};

use crate::db::{RepositoryError, UserStore};
use crate::models::{NewUser, User};

/// Validated self-registration input.
#[derive(Debug)]
pub struct Registration {
    pub name: PersonName,
    pub email: Email,
    pub password: Password,
    pub address: Address,
}

/// A user together with a freshly issued bearer token.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    tokens: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, tokens: &'a TokenKeys) -> Self {
        Self { users, tokens }
    }

    /// Register a new `normal` user and sign them in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<Session, AuthError> {
        if self.users.get_by_email(&registration.email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(registration.password).await?;

        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                password_hash,
                address: registration.address,
                role: Role::Normal,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "user registered");

        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    /// Login with email and password.
    ///
    /// Unknown emails, malformed emails, and wrong passwords are
    /// indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password.to_owned(), password_hash).await?;

        let token = self.tokens.issue(&user)?;
        Ok(Session { user, token })
    }

    /// Change a user's password after checking the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user no longer exists.
    /// Returns `AuthError::IncorrectCurrentPassword` if `current` is wrong.
    pub async fn update_password(
        &self,
        user_id: UserId,
        current: &str,
        new: Password,
    ) -> Result<(), AuthError> {
        let stored = self
            .users
            .get_password_hash(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current.to_owned(), stored)
            .await
            .map_err(|e| match e {
                AuthError::InvalidCredentials => AuthError::IncorrectCurrentPassword,
                other => other,
            })?;

        let password_hash = hash_password(new).await?;
        self.users
            .update_password_hash(user_id, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user_id, "password updated");
        Ok(())
    }

    /// Verify a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any token that fails verification.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.tokens.verify(token)
    }
}
