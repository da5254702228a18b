//! Document state store for one bound meeting.

use crate::document_id::DocumentId;
use crate::models::Meeting;
use crate::session::scheduler::Field;

/// What the user currently sees for the bound meeting, next to what was
/// last known to be persisted.
///
/// The persisted values only change through [`EditSession::mark_persisted`]
/// (or by seeding a new session), never while editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    active_document_id: DocumentId,
    pending_title: String,
    pending_body: String,
    last_persisted_title: String,
    last_persisted_body: String,
    is_dirty: bool,
}

impl EditSession {
    /// Seeds a clean session from a meeting snapshot.
    pub fn seed(meeting: &Meeting) -> Self {
        let body = meeting.body_html().to_string();
        Self {
            active_document_id: meeting.id.clone(),
            pending_title: meeting.title.clone(),
            pending_body: body.clone(),
            last_persisted_title: meeting.title.clone(),
            last_persisted_body: body,
            is_dirty: false,
        }
    }

    pub fn active_document_id(&self) -> &DocumentId {
        &self.active_document_id
    }

    pub fn pending_title(&self) -> &str {
        &self.pending_title
    }

    pub fn pending_body(&self) -> &str {
        &self.pending_body
    }

    pub fn last_persisted_title(&self) -> &str {
        &self.last_persisted_title
    }

    pub fn last_persisted_body(&self) -> &str {
        &self.last_persisted_body
    }

    /// Replaces the pending body. Returns the new dirty flag.
    pub fn set_body(&mut self, body: impl Into<String>) -> bool {
        self.pending_body = body.into();
        self.is_dirty = self.pending_body != self.last_persisted_body;
        self.is_dirty
    }

    /// Replaces the pending title. Returns whether it differs from the last
    /// persisted title.
    pub fn set_title(&mut self, title: impl Into<String>) -> bool {
        self.pending_title = title.into();
        self.is_title_dirty()
    }

    /// Body differs from what was last persisted.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_saved(&self) -> bool {
        !self.is_dirty
    }

    pub fn is_title_dirty(&self) -> bool {
        self.pending_title != self.last_persisted_title
    }

    pub fn pending(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.pending_title,
            Field::Body => &self.pending_body,
        }
    }

    pub fn last_persisted(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.last_persisted_title,
            Field::Body => &self.last_persisted_body,
        }
    }

    /// Records a successful write of `value` for `field`.
    pub fn mark_persisted(&mut self, field: Field, value: &str) {
        match field {
            Field::Title => self.last_persisted_title = value.to_string(),
            Field::Body => {
                self.last_persisted_body = value.to_string();
                self.is_dirty = self.pending_body != self.last_persisted_body;
            }
        }
    }
}
