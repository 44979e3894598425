//! Indian mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number must contain only digits")]
    NonDigit,
    #[error("phone number must be exactly 10 digits")]
    WrongLength,
    #[error("phone number must start with 6, 7, 8 or 9")]
    InvalidPrefix,
}

/// A ten-digit Indian mobile number (`^[6-9]\d{9}$`).
///
/// ```
/// use akf_core::Phone;
///
/// assert!(Phone::parse("9876543210").is_ok());
/// assert!(Phone::parse("5876543210").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Number of digits in a mobile number.
    pub const LENGTH: usize = 10;

    /// Parse a mobile number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`PhoneError`] when the input is not a valid mobile number.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }
        if s.len() != Self::LENGTH {
            return Err(PhoneError::WrongLength);
        }
        if !s.starts_with(['6', '7', '8', '9']) {
            return Err(PhoneError::InvalidPrefix);
        }
        Ok(Self(s.to_owned()))
    }

    /// Keep only the digits of `s`, capped at ten.
    ///
    /// Mirrors what the address form accepts while typing.
    #[must_use]
    pub fn sanitize(s: &str) -> String {
        s.chars()
            .filter(char::is_ascii_digit)
            .take(Self::LENGTH)
            .collect()
    }

    /// Returns the number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        for n in ["6000000000", "7680924488", "8897393151", " 9999999999 "] {
            assert!(Phone::parse(n).is_ok(), "{n}");
        }
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("98765-43210"), Err(PhoneError::NonDigit));
        assert_eq!(Phone::parse("+919876543210"), Err(PhoneError::NonDigit));
        assert_eq!(Phone::parse("987654321"), Err(PhoneError::WrongLength));
        assert_eq!(Phone::parse("1234567890"), Err(PhoneError::InvalidPrefix));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(Phone::sanitize("+91 98765-43210"), "9198765432");
        assert_eq!(Phone::sanitize("98765 43210"), "9876543210");
    }
}
