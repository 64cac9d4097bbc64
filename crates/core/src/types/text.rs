//! Length-bounded text fields for user and store profiles.

use serde::{Deserialize, Serialize};

/// Error returned when a text field is outside its length bounds.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} must be between {min} and {max} characters")]
pub struct TextError {
    /// Human-readable field name.
    pub field: &'static str,
    /// Minimum length in characters.
    pub min: usize,
    /// Maximum length in characters.
    pub max: usize,
}

/// Defines a trimmed string newtype whose length (in characters) must fall
/// within `min..=max`.
macro_rules! bounded_text {
    ($(#[$meta:meta])* $name:ident, $field:literal, $min:literal, $max:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Minimum length in characters.
            pub const MIN_LENGTH: usize = $min;
            /// Maximum length in characters.
            pub const MAX_LENGTH: usize = $max;

            /// Trim and validate the input.
            ///
            /// # Errors
            ///
            /// Returns [`TextError`] if the trimmed length is out of bounds.
            pub fn parse(s: &str) -> Result<Self, TextError> {
                let trimmed = s.trim();
                let len = trimmed.chars().count();
                if (Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
                    Ok(Self(trimmed.to_owned()))
                } else {
                    Err(TextError {
                        field: $field,
                        min: Self::MIN_LENGTH,
                        max: Self::MAX_LENGTH,
                    })
                }
            }

            /// Returns the value as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the value and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = TextError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

bounded_text!(
    /// A user's full name (20-60 characters).
    PersonName,
    "name",
    20,
    60
);

bounded_text!(
    /// A store's display name (20-60 characters).
    StoreName,
    "store name",
    20,
    60
);

bounded_text!(
    /// A postal address (1-400 characters).
    Address,
    "address",
    1,
    400
);
