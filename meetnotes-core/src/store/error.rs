//! Persistence error types.

use crate::document_id::DocumentId;

/// Errors that can occur while talking to the persistence service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// No server configured
    NotConfigured,
    /// Request could not be sent or the response could not be read
    HttpError(String),
    /// Token rejected by the server
    Unauthorized,
    /// Meeting does not exist on the server
    NotFound(DocumentId),
    /// Any other non-success status
    Status(u16),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::NotConfigured => {
                write!(f, "Server not configured. Add server_url to config.")
            }
            PersistError::HttpError(e) => write!(f, "HTTP error: {}", e),
            PersistError::Unauthorized => write!(f, "Server rejected the API token"),
            PersistError::NotFound(id) => write!(f, "Meeting not found on server: {}", id),
            PersistError::Status(code) => write!(f, "Server returned status {}", code),
        }
    }
}

impl std::error::Error for PersistError {}
