use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a single comment, message or statement.
pub const MAX_TEXT_CHARS: usize = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TextError {
    #[error("text cannot be empty")]
    Empty,
    #[error("text exceeds {max} characters")]
    TooLong { max: usize },
}

/// User-authored text: trimmed, non-empty, bounded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyText(String);

impl BodyText {
    /// Validates and trims user input.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` for blank input and `TextError::TooLong`
    /// past `MAX_TEXT_CHARS`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TextError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.chars().count() > MAX_TEXT_CHARS {
            return Err(TextError::TooLong {
                max: MAX_TEXT_CHARS,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BodyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_keeps_content() {
        let text = BodyText::parse("  hello  ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn rejects_whitespace_only() {
        assert_eq!(BodyText::parse(" \n\t ").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn rejects_oversized_text() {
        let long = "x".repeat(MAX_TEXT_CHARS + 1);
        assert!(matches!(
            BodyText::parse(long),
            Err(TextError::TooLong { .. })
        ));
    }
}
