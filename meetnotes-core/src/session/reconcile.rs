//! Binding of the notes session to a meeting identity.
//!
//! [`transition`] is pure: it looks at the current session state and the
//! incoming snapshot and returns the next binding plus the effects the
//! session has to perform, in order.

use crate::document_id::DocumentId;
use crate::models::Meeting;
use crate::session::state::EditSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Unbound,
    Bound(DocumentId),
}

impl Binding {
    pub fn of(session: Option<&EditSession>) -> Self {
        match session {
            Some(s) => Binding::Bound(s.active_document_id().clone()),
            None => Binding::Unbound,
        }
    }

    pub fn id(&self) -> Option<&DocumentId> {
        match self {
            Binding::Bound(id) => Some(id),
            Binding::Unbound => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Cancel every pending autosave timer of the previous binding
    CancelTimers,
    /// Replace the local state with this freshly seeded session
    Seed(EditSession),
    /// Replace the body editor content, focus it and put the cursor at 0
    ResetEditor { content: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: Binding,
    pub effects: Vec<Effect>,
}

/// Computes what presenting `incoming` does to a session bound as `current`.
///
/// - Unbound: seed and reset the editor.
/// - Bound to another id: cancel timers first, then seed and reset.
/// - Bound to the same id: nothing; local edits survive metadata refreshes.
pub fn transition(current: &Binding, incoming: &Meeting) -> Transition {
    let next = Binding::Bound(incoming.id.clone());
    let seed = || {
        let session = EditSession::seed(incoming);
        let content = session.pending_body().to_string();
        [Effect::Seed(session), Effect::ResetEditor { content }]
    };

    let effects = match current {
        Binding::Bound(id) if *id == incoming.id => Vec::new(),
        Binding::Bound(_) => {
            let mut effects = vec![Effect::CancelTimers];
            effects.extend(seed());
            effects
        }
        Binding::Unbound => seed().into(),
    };

    Transition { next, effects }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn meeting(id: &str, body: &str) -> Meeting {
        Meeting::new(
            DocumentId::parse(id).unwrap(),
            format!("Meeting {}", id),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
        )
        .with_body(body)
    }

    #[test]
    fn test_first_presentation_seeds() {
        let a = meeting("a", "<p>a</p>");
        let t = transition(&Binding::Unbound, &a);

        assert_eq!(t.next, Binding::Bound(a.id.clone()));
        assert_eq!(
            t.effects,
            vec![
                Effect::Seed(EditSession::seed(&a)),
                Effect::ResetEditor {
                    content: "<p>a</p>".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_identity_change_cancels_before_seeding() {
        let a = meeting("a", "<p>a</p>");
        let b = meeting("b", "");
        let t = transition(&Binding::Bound(a.id.clone()), &b);

        assert_eq!(t.next, Binding::Bound(b.id.clone()));
        assert_eq!(t.effects.len(), 3);
        assert_eq!(t.effects[0], Effect::CancelTimers);
        assert!(matches!(t.effects[1], Effect::Seed(ref s) if s.active_document_id() == &b.id));
        assert_eq!(
            t.effects[2],
            Effect::ResetEditor {
                content: "<p></p>".to_string()
            }
        );
    }

    #[test]
    fn test_same_identity_is_a_no_op() {
        let a = meeting("a", "<p>a</p>");
        let refreshed = meeting("a", "<p>changed elsewhere</p>");
        let t = transition(&Binding::Bound(a.id.clone()), &refreshed);

        assert_eq!(t.next, Binding::Bound(a.id));
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_binding_of_session() {
        assert_eq!(Binding::of(None), Binding::Unbound);
        let a = meeting("a", "");
        let s = EditSession::seed(&a);
        assert_eq!(Binding::of(Some(&s)).id(), Some(&a.id));
    }
}
