//! Publication identifier parsing and validation
//!
//! A publication id is what follows `p_id=` in an initiative's feedback URL.

use std::fmt;

/// Numeric publication id of a "Have your Say" initiative
///
/// Surrounding whitespace is ignored, everything else must be ASCII digits.
///
/// # Examples
///
/// ```
/// use hys_scraper::identifier::PublicationId;
///
/// let id = PublicationId::parse(" 24212003 ").unwrap();
/// assert_eq!(id.as_str(), "24212003");
/// assert_eq!(id.to_string(), "24212003");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicationId {
    value: String,
}

impl PublicationId {
    /// Parse a publication id
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or contains non-digit characters.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let value = s.trim();
        if value.is_empty() {
            return Err(IdentifierError::InvalidFormat(
                "publication id cannot be empty".to_string(),
            ));
        }

        if let Some(c) = value.chars().find(|c| !c.is_ascii_digit()) {
            return Err(IdentifierError::InvalidFormat(format!(
                "publication id must be numeric, found '{c}' in '{value}'"
            )));
        }

        Ok(Self {
            value: value.to_string(),
        })
    }

    /// The id as it appears in request query strings
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for PublicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl std::str::FromStr for PublicationId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors that can occur during identifier parsing
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Invalid identifier format
    #[error("identifier error: {0}")]
    InvalidFormat(String),
}
