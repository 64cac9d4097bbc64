//! Core types for the store rating platform.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod password;
pub mod rating;
pub mod role;
pub mod sort;
pub mod text;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{Password, PasswordError};
pub use rating::{RatingAggregate, RatingValue, RatingValueError};
pub use role::{Capability, Role, RoleParseError};
pub use sort::{SortOrder, SortOrderError};
pub use text::{Address, PersonName, StoreName, TextError};
