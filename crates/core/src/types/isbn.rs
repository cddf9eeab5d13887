//! Book identifiers used as catalog lookup keys

use crate::error::{AppError, Result};
use std::fmt;

/// Normalized external catalog key (ISBN-10 or ISBN-13)
///
/// Only the shape is enforced: after removing hyphens and whitespace the key
/// must be exactly 10 or 13 characters long. Check digits are not verified;
/// see [`Isbn::has_valid_checksum`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Isbn(String);

impl Isbn {
    /// Length of an ISBN-10
    pub const SHORT_LEN: usize = 10;
    /// Length of an ISBN-13
    pub const LONG_LEN: usize = 13;

    /// Strips hyphens and whitespace
    pub fn normalize(raw: &str) -> String {
        raw.chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect()
    }

    /// Returns true if `raw` would be accepted by [`Isbn::parse`]
    pub fn is_valid_shape(raw: &str) -> bool {
        let len = Self::normalize(raw).chars().count();
        len == Self::SHORT_LEN || len == Self::LONG_LEN
    }

    /// Validates and normalizes a user-entered identifier
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = Self::normalize(raw);
        let len = normalized.chars().count();

        if len == 0 {
            return Err(AppError::invalid_identifier(raw, "identifier is empty"));
        }

        if len != Self::SHORT_LEN && len != Self::LONG_LEN {
            return Err(AppError::invalid_identifier(
                raw,
                format!(
                    "must be {} or {} characters after removing hyphens and spaces (got {})",
                    Self::SHORT_LEN,
                    Self::LONG_LEN,
                    len
                ),
            ));
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for the 13-character form
    pub fn is_isbn13(&self) -> bool {
        self.0.chars().count() == Self::LONG_LEN
    }

    /// Verifies the ISBN check digit
    ///
    /// Not used by [`Isbn::parse`]; callers that want the stricter check must
    /// opt in explicitly.
    pub fn has_valid_checksum(&self) -> bool {
        let chars: Vec<char> = self.0.chars().collect();

        if self.is_isbn13() {
            let mut sum = 0;
            for (i, c) in chars.iter().enumerate() {
                let Some(digit) = c.to_digit(10) else {
                    return false;
                };
                sum += if i % 2 == 0 { digit } else { digit * 3 };
            }
            return sum % 10 == 0;
        }

        let mut sum = 0;
        for (i, c) in chars.iter().enumerate() {
            let value = match c.to_digit(10) {
                Some(d) => d,
                // X stands for 10, only valid as the check digit
                None if i == Self::SHORT_LEN - 1 && (*c == 'X' || *c == 'x') => 10,
                None => return false,
            };
            sum += value * (Self::SHORT_LEN as u32 - i as u32);
        }
        sum % 11 == 0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_isbn10() {
        let isbn = Isbn::parse("0306406152").unwrap();
        assert_eq!(isbn.as_str(), "0306406152");
        assert!(!isbn.is_isbn13());
    }

    #[test]
    fn test_accepts_isbn13_with_separators() {
        let isbn = Isbn::parse("978-0-306-40615 7").unwrap();
        assert_eq!(isbn.as_str(), "9780306406157");
        assert!(isbn.is_isbn13());
    }

    #[test]
    fn test_rejects_short_identifier() {
        let err = Isbn::parse("123").unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_rejects_empty_identifier() {
        assert!(Isbn::parse("").is_err());
        assert!(Isbn::parse(" - - ").is_err());
    }

    #[test]
    fn test_length_only_accepts_non_numeric_suffix() {
        // Shape check only: a 13-character key with a letter still passes
        assert!(Isbn::parse("978030640615X").is_ok());
        assert!(Isbn::is_valid_shape("978030640615X"));
    }

    #[test]
    fn test_rejects_lengths_other_than_10_or_13() {
        for raw in ["123456789", "12345678901", "123456789012", "12345678901234"] {
            assert!(!Isbn::is_valid_shape(raw), "{} should be rejected", raw);
        }
    }

    #[test]
    fn test_checksum_isbn10() {
        assert!(Isbn::parse("0306406152").unwrap().has_valid_checksum());
        assert!(Isbn::parse("080442957X").unwrap().has_valid_checksum());
        assert!(!Isbn::parse("0306406153").unwrap().has_valid_checksum());
    }

    #[test]
    fn test_checksum_isbn13() {
        assert!(Isbn::parse("9780306406157").unwrap().has_valid_checksum());
        assert!(!Isbn::parse("9780306406158").unwrap().has_valid_checksum());
        assert!(!Isbn::parse("978030640615X").unwrap().has_valid_checksum());
    }
}
