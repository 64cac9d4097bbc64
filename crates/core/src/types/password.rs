//! Plaintext password policy.
//!
//! A [`Password`] only ever lives for the duration of a request: it is
//! validated, handed to the hasher, and dropped. It is never serialized and
//! its `Debug` output is redacted.

/// Reasons a password fails the policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// Too short or too long.
    #[error("password must be between {min} and {max} characters")]
    Length {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
    },
    /// No uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    MissingUppercase,
    /// No special character.
    #[error("password must contain at least one special character")]
    MissingSpecial,
}

/// A plaintext password that satisfies the platform policy:
/// 8-16 characters, at least one uppercase letter, and at least one special
/// character (anything that is neither alphanumeric nor whitespace).
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Minimum length in characters.
    pub const MIN_LENGTH: usize = 8;
    /// Maximum length in characters.
    pub const MAX_LENGTH: usize = 16;

    /// Validate a candidate password.
    ///
    /// # Errors
    ///
    /// Returns the first [`PasswordError`] the candidate violates.
    pub fn parse(s: &str) -> Result<Self, PasswordError> {
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(PasswordError::Length {
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }

        if !s.chars().any(char::is_uppercase) {
            return Err(PasswordError::MissingUppercase);
        }

        if !s.chars().any(|c| !c.is_alphanumeric() && !c.is_whitespace()) {
            return Err(PasswordError::MissingSpecial);
        }

        Ok(Self(s.to_owned()))
    }

    /// Expose the plaintext for hashing.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
