//! Persistence of meetings.
//!
//! The notes session only needs one outbound call, [`MeetingStore::update_meeting`].
//! [`HttpMeetingStore`] implements it against the meetnotes server and also
//! offers the read/create calls the CLI needs; [`MemoryMeetingStore`] keeps
//! everything in process.

mod client;
mod error;
mod memory;

use futures::future::BoxFuture;

use crate::document_id::DocumentId;
use crate::models::MeetingPatch;

pub use client::{HttpMeetingStore, NewMeeting};
pub use error::PersistError;
pub use memory::{MemoryMeetingStore, RecordedUpdate};

/// Bearer credential passed with every persistence call.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Outbound persistence target for meeting notes.
///
/// Writes overwrite the named fields of one meeting. There is no version
/// check: concurrent writers resolve as last-write-wins.
pub trait MeetingStore: Send + Sync {
    fn update_meeting<'a>(
        &'a self,
        token: &'a SessionToken,
        patch: &'a MeetingPatch,
        id: &'a DocumentId,
    ) -> BoxFuture<'a, Result<(), PersistError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("secret");
        assert_eq!(format!("{:?}", token), "SessionToken(***)");
        assert_eq!(token.as_str(), "secret");
    }
}
