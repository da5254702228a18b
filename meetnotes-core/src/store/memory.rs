//! In-process meeting store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use tokio::time::Instant;

use super::{MeetingStore, PersistError, SessionToken};
use crate::document_id::DocumentId;
use crate::models::{Meeting, MeetingPatch};

/// One call made to [`MemoryMeetingStore::update_meeting`].
#[derive(Debug, Clone)]
pub struct RecordedUpdate {
    pub id: DocumentId,
    pub patch: MeetingPatch,
    pub at: Instant,
    pub succeeded: bool,
}

/// Meeting store kept in memory. Records every update attempt, which makes
/// it useful for observing autosave behaviour.
#[derive(Debug, Default)]
pub struct MemoryMeetingStore {
    meetings: Mutex<HashMap<DocumentId, Meeting>>,
    updates: Mutex<Vec<RecordedUpdate>>,
    failing: AtomicBool,
}

impl MemoryMeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meetings(meetings: impl IntoIterator<Item = Meeting>) -> Self {
        let store = Self::new();
        for meeting in meetings {
            store.insert(meeting);
        }
        store
    }

    pub fn insert(&self, meeting: Meeting) {
        self.meetings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(meeting.id.clone(), meeting);
    }

    pub fn get(&self, id: &DocumentId) -> Option<Meeting> {
        self.meetings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// All update attempts so far, oldest first.
    pub fn updates(&self) -> Vec<RecordedUpdate> {
        self.updates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Makes subsequent updates fail with an HTTP error until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn apply(&self, patch: &MeetingPatch, id: &DocumentId) -> Result<(), PersistError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistError::HttpError("connection refused".to_string()));
        }
        let mut meetings = self.meetings.lock().unwrap_or_else(PoisonError::into_inner);
        match meetings.get_mut(id) {
            Some(meeting) => {
                meeting.apply(patch);
                Ok(())
            }
            None => Err(PersistError::NotFound(id.clone())),
        }
    }
}

impl MeetingStore for MemoryMeetingStore {
    fn update_meeting<'a>(
        &'a self,
        _token: &'a SessionToken,
        patch: &'a MeetingPatch,
        id: &'a DocumentId,
    ) -> BoxFuture<'a, Result<(), PersistError>> {
        Box::pin(async move {
            let result = self.apply(patch, id);
            self.updates
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedUpdate {
                    id: id.clone(),
                    patch: patch.clone(),
                    at: Instant::now(),
                    succeeded: result.is_ok(),
                });
            result
        })
    }
}
