//! Meetnotes Core Library
//!
//! Agenda projection and the debounced autosave core for meeting notes.

pub mod agenda;
pub mod document_id;
pub mod format;
pub mod models;
pub mod session;
pub mod store;

pub use agenda::{agenda_for, agenda_for_in, AgendaItem};
pub use document_id::{DocumentId, DocumentIdError};
pub use models::{Meeting, MeetingPatch, EMPTY_BODY};
pub use session::{
    BodyEditor, EnterOutcome, Field, NotesSession, SaveStatus, SessionEvent, TitleInput,
    DEFAULT_SAVE_DELAY,
};
pub use store::{
    HttpMeetingStore, MeetingStore, MemoryMeetingStore, NewMeeting, PersistError, SessionToken,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
