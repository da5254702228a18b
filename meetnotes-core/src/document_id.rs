//! Meeting document identifiers.
//!
//! Ids are opaque strings issued by the persistence service. They end up in
//! URL paths and file names, so only a conservative character set is allowed.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest id accepted from the service.
pub const MAX_ID_LEN: usize = 128;

/// Errors that can occur with document IDs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DocumentIdError {
    #[error("Document ID must not be empty")]
    Empty,

    #[error("Document ID too long: {0} characters (max {max})", max = MAX_ID_LEN)]
    TooLong(usize),

    #[error("Invalid character {0:?} in document ID")]
    InvalidCharacter(char),
}

/// Identity of one meeting record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a fresh random id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Validate and wrap an id string
    pub fn parse(s: &str) -> Result<Self, DocumentIdError> {
        if s.is_empty() {
            return Err(DocumentIdError::Empty);
        }
        if s.len() > MAX_ID_LEN {
            return Err(DocumentIdError::TooLong(s.len()));
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(DocumentIdError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DocumentId {
    type Error = DocumentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique_and_valid() {
        let id1 = DocumentId::generate();
        let id2 = DocumentId::generate();
        assert_ne!(id1, id2);
        assert!(DocumentId::parse(id1.as_str()).is_ok());
    }

    #[test]
    fn test_parse_accepts_object_ids() {
        let id = DocumentId::parse("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(id.to_string(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(DocumentId::parse(""), Err(DocumentIdError::Empty));
        assert_eq!(
            DocumentId::parse("../etc"),
            Err(DocumentIdError::InvalidCharacter('.'))
        );
        let long = "a".repeat(MAX_ID_LEN + 1);
        assert_eq!(
            DocumentId::parse(&long),
            Err(DocumentIdError::TooLong(MAX_ID_LEN + 1))
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: DocumentId = serde_json::from_str("\"meet-1\"").unwrap();
        assert_eq!(ok.as_str(), "meet-1");

        let bad: Result<DocumentId, _> = serde_json::from_str("\"a/b\"");
        assert!(bad.is_err());
    }
}
