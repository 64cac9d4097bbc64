//! Store Rating Core - Shared domain types.
//!
//! This crate provides the validated types used across the store rating
//! platform:
//! - `server` - JSON REST API (users, stores, ratings)
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP. Every constructor parses untrusted input into a value that is
//! valid by construction, so the server never re-checks shape or range.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, roles, rating values and aggregates,
//!   bounded text fields, passwords, and sort orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
