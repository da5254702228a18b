//! Notes editing session with debounced autosave.
//!
//! A [`NotesSession`] is bound to at most one meeting at a time. Edits are
//! applied synchronously to the local state; persistence happens later, once
//! a field has been quiet for the save delay.
//!
//! The session is driven from a single owner. Timer firings and save
//! completions arrive as [`SessionEvent`]s on the session's own channel and
//! take effect only when the owner passes them to
//! [`NotesSession::handle_event`], typically from a `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(event) = session.next_event() => session.handle_event(event),
//!         line = input.next_line() => session.set_body(render(line?)),
//!     }
//! }
//! ```
//!
//! All operations must run inside a tokio runtime.

mod editor;
mod reconcile;
mod scheduler;
mod state;
mod title;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::document_id::DocumentId;
use crate::models::{Meeting, MeetingPatch};
use crate::store::{MeetingStore, PersistError, SessionToken};

pub use editor::{BodyEditor, TitleInput};
pub use reconcile::{transition, Binding, Effect, Transition};
pub use scheduler::{AutosaveScheduler, Field, TimerTicket};
pub use state::EditSession;
pub use title::{handle_enter, insert_line_break, title_rows, EnterOutcome};

/// Quiet period before an edited field is saved.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(500);

/// Asynchronous notifications for the session owner.
#[derive(Debug)]
pub enum SessionEvent {
    /// A debounce timer scheduled while bound to `id` ran out
    TimerFired { id: DocumentId, ticket: TimerTicket },
    /// A write started for `id` during binding `epoch` completed
    SaveFinished {
        id: DocumentId,
        epoch: u64,
        field: Field,
        value: String,
        result: Result<(), PersistError>,
    },
}

/// Snapshot of the session's save state, for status indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveStatus {
    pub document_id: Option<DocumentId>,
    pub dirty: bool,
    pub title_dirty: bool,
    pub saving: bool,
    pub last_error: Option<PersistError>,
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        !self.dirty
    }
}

impl std::fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(id) = &self.document_id else {
            return write!(f, "no meeting open");
        };
        let state = if self.saving {
            "saving"
        } else if self.dirty || self.title_dirty {
            "unsaved"
        } else {
            "saved"
        };
        write!(f, "{}: {}", id, state)?;
        if let Some(err) = &self.last_error {
            write!(f, " (last save failed: {})", err)?;
        }
        Ok(())
    }
}

/// Editing session for meeting notes.
pub struct NotesSession {
    store: Arc<dyn MeetingStore>,
    token: SessionToken,
    save_delay: Duration,
    scheduler: AutosaveScheduler,
    edit: Option<EditSession>,
    source: Option<Meeting>,
    /// Value handed to the store per field, until it reports back. At most
    /// one write per field is outstanding.
    in_flight: HashMap<Field, String>,
    /// Fields that came due while their previous write was outstanding
    deferred: HashSet<Field>,
    saves_in_flight: usize,
    /// Bumped on every seed or detach; completions from older bindings are
    /// not applied
    epoch: u64,
    last_error: Option<PersistError>,
    body_editor: Option<Box<dyn BodyEditor>>,
    title_input: Option<Box<dyn TitleInput>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl NotesSession {
    pub fn new(store: Arc<dyn MeetingStore>, token: SessionToken) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            token,
            save_delay: DEFAULT_SAVE_DELAY,
            scheduler: AutosaveScheduler::new(),
            edit: None,
            source: None,
            in_flight: HashMap::new(),
            deferred: HashSet::new(),
            saves_in_flight: 0,
            epoch: 0,
            last_error: None,
            body_editor: None,
            title_input: None,
            events_tx,
            events_rx,
        }
    }

    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    pub fn with_body_editor(mut self, editor: Box<dyn BodyEditor>) -> Self {
        self.body_editor = Some(editor);
        self
    }

    pub fn with_title_input(mut self, input: Box<dyn TitleInput>) -> Self {
        self.title_input = Some(input);
        self
    }

    pub fn save_delay(&self) -> Duration {
        self.save_delay
    }

    pub fn binding(&self) -> Binding {
        Binding::of(self.edit.as_ref())
    }

    /// Local state of the bound meeting.
    pub fn document(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    /// Most recent snapshot presented for the bound meeting.
    pub fn source(&self) -> Option<&Meeting> {
        self.source.as_ref()
    }

    pub fn status(&self) -> SaveStatus {
        SaveStatus {
            document_id: self.edit.as_ref().map(|e| e.active_document_id().clone()),
            dirty: self.edit.as_ref().is_some_and(EditSession::is_dirty),
            title_dirty: self.edit.as_ref().is_some_and(EditSession::is_title_dirty),
            saving: !self.in_flight.is_empty(),
            last_error: self.last_error.clone(),
        }
    }

    /// Presents a meeting snapshot. Switching to a different meeting cancels
    /// pending saves of the previous one and reseeds the editors; presenting
    /// the bound meeting again keeps local edits.
    pub fn present(&mut self, meeting: Meeting) {
        let previous = self.binding();
        let Transition { next, effects } = transition(&previous, &meeting);

        for effect in effects {
            match effect {
                Effect::CancelTimers => self.scheduler.cancel_all(),
                Effect::Seed(session) => {
                    let rows = title_rows(session.pending_title());
                    self.edit = Some(session);
                    self.epoch += 1;
                    self.in_flight.clear();
                    self.deferred.clear();
                    self.last_error = None;
                    if let Some(input) = self.title_input.as_mut() {
                        input.resize_to_fit(rows);
                    }
                }
                Effect::ResetEditor { content } => {
                    if let Some(editor) = self.body_editor.as_mut() {
                        editor.set_content(&content);
                        editor.focus();
                        editor.set_cursor_position(0);
                    }
                }
            }
        }

        if previous != next {
            info!(from = ?previous.id(), to = %meeting.id, "notes session bound");
        }
        self.source = Some(meeting);
    }

    /// Unbinds the session, cancelling pending saves.
    pub fn detach(&mut self) {
        self.scheduler.cancel_all();
        if let Some(edit) = self.edit.take() {
            debug!(id = %edit.active_document_id(), "notes session detached");
        }
        self.source = None;
        self.epoch += 1;
        self.in_flight.clear();
        self.deferred.clear();
    }

    /// Replaces the body and (re)schedules its autosave when it differs from
    /// the persisted body. No-op when no meeting is bound.
    pub fn set_body(&mut self, body: impl Into<String>) {
        let Some(edit) = self.edit.as_mut() else {
            debug!("set_body ignored: no meeting bound");
            return;
        };
        if edit.set_body(body) {
            self.schedule_save(Field::Body);
        } else {
            self.scheduler.cancel(Field::Body);
        }
    }

    /// Replaces the title, resizes the title input and (re)schedules the
    /// title autosave. No-op when no meeting is bound.
    pub fn set_title(&mut self, title: impl Into<String>) {
        let Some(edit) = self.edit.as_mut() else {
            debug!("set_title ignored: no meeting bound");
            return;
        };
        let dirty = edit.set_title(title);
        let rows = title_rows(edit.pending_title());
        if let Some(input) = self.title_input.as_mut() {
            input.resize_to_fit(rows);
        }
        if dirty {
            self.schedule_save(Field::Title);
        } else {
            self.scheduler.cancel(Field::Title);
        }
    }

    /// Enter pressed in the title with the cursor at `cursor`.
    pub fn title_enter(&mut self, cursor: usize, modifier: bool) -> EnterOutcome {
        let Some(edit) = self.edit.as_ref() else {
            return EnterOutcome::Ignored;
        };
        let outcome = handle_enter(
            edit.pending_title(),
            cursor,
            modifier,
            self.body_editor.is_some(),
        );

        match &outcome {
            EnterOutcome::LineBreak { title, cursor } => {
                self.set_title(title.clone());
                if let Some(input) = self.title_input.as_mut() {
                    input.set_cursor_position(*cursor);
                }
            }
            EnterOutcome::FocusBody => {
                if let Some(editor) = self.body_editor.as_mut() {
                    editor.focus();
                    editor.set_cursor_position(0);
                }
            }
            EnterOutcome::Ignored => {}
        }
        outcome
    }

    /// Cancels pending timers and starts saves for every field that needs
    /// one right away. Returns the number of saves started.
    pub fn save_now(&mut self) -> usize {
        let Some(id) = self.edit.as_ref().map(|e| e.active_document_id().clone()) else {
            return 0;
        };
        let mut started = 0;
        for field in [Field::Title, Field::Body] {
            self.scheduler.cancel(field);
            if self.start_save(&id, field) {
                started += 1;
            }
        }
        started
    }

    /// Waits for the next event. Never returns `None` while the session is
    /// alive.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    pub fn try_next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.try_recv().ok()
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TimerFired { id, ticket } => {
                if !self.scheduler.complete(ticket) {
                    debug!(%id, field = %ticket.field, "stale autosave timer ignored");
                    return;
                }
                self.start_save(&id, ticket.field);
            }
            SessionEvent::SaveFinished {
                id,
                epoch,
                field,
                value,
                result,
            } => self.finish_save(id, epoch, field, value, result),
        }
    }

    /// Handles events until no timer is pending and no save is in flight.
    pub async fn settle(&mut self) {
        while self.scheduler.has_pending() || self.saves_in_flight > 0 {
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    fn schedule_save(&mut self, field: Field) {
        let Some(id) = self.edit.as_ref().map(|e| e.active_document_id().clone()) else {
            return;
        };
        let tx = self.events_tx.clone();
        self.scheduler.schedule(field, self.save_delay, move |ticket| {
            let _ = tx.send(SessionEvent::TimerFired { id, ticket });
        });
    }

    fn start_save(&mut self, id: &DocumentId, field: Field) -> bool {
        let Some(edit) = self.edit.as_ref() else {
            return false;
        };
        if edit.active_document_id() != id {
            debug!(%id, %field, "save skipped: meeting no longer bound");
            return false;
        }

        let value = edit.pending(field).to_string();
        if value == edit.last_persisted(field) || self.in_flight.get(&field) == Some(&value) {
            debug!(%id, %field, "save skipped: nothing new to persist");
            return false;
        }
        if self.in_flight.contains_key(&field) {
            // Started again from finish_save, so writes of a field never overlap
            debug!(%id, %field, "save deferred: previous write still in flight");
            self.deferred.insert(field);
            return false;
        }

        self.in_flight.insert(field, value.clone());
        self.saves_in_flight += 1;

        let store = Arc::clone(&self.store);
        let token = self.token.clone();
        let tx = self.events_tx.clone();
        let id = id.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let patch = match field {
                Field::Title => MeetingPatch::title(value.clone()),
                Field::Body => MeetingPatch::body(value.clone()),
            };
            let result = store.update_meeting(&token, &patch, &id).await;
            let _ = tx.send(SessionEvent::SaveFinished {
                id,
                epoch,
                field,
                value,
                result,
            });
        });
        true
    }

    fn finish_save(
        &mut self,
        id: DocumentId,
        epoch: u64,
        field: Field,
        value: String,
        result: Result<(), PersistError>,
    ) {
        self.saves_in_flight = self.saves_in_flight.saturating_sub(1);

        let bound = self.epoch == epoch;
        let Some(edit) = self.edit.as_mut().filter(|_| bound) else {
            match result {
                Ok(()) => debug!(%id, %field, "saved meeting that is no longer bound"),
                Err(e) => warn!(%id, %field, error = %e, "save failed for meeting no longer bound"),
            }
            return;
        };

        self.in_flight.remove(&field);
        match result {
            Ok(()) => {
                edit.mark_persisted(field, &value);
                self.last_error = None;
                info!(%id, %field, "meeting notes saved");
            }
            Err(e) => {
                warn!(%id, %field, error = %e, "failed to save meeting notes");
                self.last_error = Some(e);
            }
        }

        if self.deferred.remove(&field) {
            self.start_save(&id, field);
        }
    }
}
