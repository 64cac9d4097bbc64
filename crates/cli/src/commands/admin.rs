//! Administrator bootstrap.
//!
//! The API only lets administrators create other administrators, so the
//! first one is created here.
//!
//! # Usage
//!
//! ```bash
//! RATING_ADMIN_PASSWORD='Secret#Pass1' \
//!     sr-cli admin create -e admin@example.com -n "Platform Administrator Account" -a "1 Main Street"
//! ```
//!
//! # Environment Variables
//!
//! - `RATING_DATABASE_URL` - `PostgreSQL` connection string
//! - `RATING_ADMIN_PASSWORD` - Initial password, if `--password` is not given

use store_rating_core::{Address, Email, Password, PersonName, Role};
use store_rating_server::db::Database;
use store_rating_server::services::{AdminError as ServiceError, AdminService, UserInput};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// A field failed validation.
    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Could not create user: {0}")]
    Service(ServiceError),
}

fn invalid(field: &'static str, reason: impl std::fmt::Display) -> AdminError {
    AdminError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

/// Validate the inputs with the same rules as the API.
fn parse_input(
    email: &str,
    name: &str,
    address: &str,
    password: &str,
) -> Result<UserInput, AdminError> {
    Ok(UserInput {
        name: PersonName::parse(name).map_err(|e| invalid("name", e))?,
        email: Email::parse(email).map_err(|e| invalid("email", e))?,
        password: Password::parse(password).map_err(|e| invalid("password", e))?,
        address: Address::parse(address).map_err(|e| invalid("address", e))?,
    })
}

/// Create a new administrator.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_admin(
    email: &str,
    name: &str,
    address: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let input = parse_input(email, name, address, password)?;
    let email = input.email.to_string();

    let pool = connect().await?;
    let db = Database::postgres(pool);

    tracing::info!("Creating administrator: {}", email);

    let user = AdminService::new(&db)
        .create_user(input, Role::Admin)
        .await
        .map_err(|e| match e {
            ServiceError::UserEmailTaken => AdminError::UserExists(email.clone()),
            other => AdminError::Service(other),
        })?;

    tracing::info!(
        "Administrator created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
