use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document_id::DocumentId;

/// Body used when a meeting has no notes yet.
pub const EMPTY_BODY: &str = "<p></p>";

/// A meeting as delivered by the persistence service.
///
/// The notes session treats every `Meeting` it is handed as a value
/// snapshot: later changes on the server only reach the session when a new
/// snapshot is presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: DocumentId,
    #[serde(default)]
    pub title: String,
    /// Serialized rich text (HTML)
    #[serde(default)]
    pub body: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_link: Option<String>,
}

impl Meeting {
    pub fn new(
        id: DocumentId,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            body: None,
            start,
            end,
            join_link: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_join_link(mut self, link: impl Into<String>) -> Self {
        self.join_link = Some(link.into());
        self
    }

    /// Body content to seed an editor with. Missing or empty bodies become
    /// an empty paragraph.
    pub fn body_html(&self) -> &str {
        match self.body.as_deref() {
            Some(body) if !body.is_empty() => body,
            _ => EMPTY_BODY,
        }
    }

    /// Applies a patch in place (last write wins per field).
    pub fn apply(&mut self, patch: &MeetingPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = Some(body.clone());
        }
    }
}

/// Partial update sent to the persistence service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl MeetingPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            body: None,
        }
    }

    pub fn body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: Some(body.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meeting() -> Meeting {
        Meeting::new(
            DocumentId::parse("m1").unwrap(),
            "Standup",
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 15, 0).unwrap(),
        )
    }

    #[test]
    fn test_body_html_defaults_to_empty_paragraph() {
        let m = meeting();
        assert_eq!(m.body_html(), EMPTY_BODY);

        let m = meeting().with_body("");
        assert_eq!(m.body_html(), EMPTY_BODY);

        let m = meeting().with_body("<p>notes</p>");
        assert_eq!(m.body_html(), "<p>notes</p>");
    }

    #[test]
    fn test_apply_patch() {
        let mut m = meeting().with_body("<p>old</p>");
        m.apply(&MeetingPatch::title("Retro"));
        assert_eq!(m.title, "Retro");
        assert_eq!(m.body_html(), "<p>old</p>");

        m.apply(&MeetingPatch::body("<p>new</p>"));
        assert_eq!(m.title, "Retro");
        assert_eq!(m.body_html(), "<p>new</p>");
    }

    #[test]
    fn test_patch_serializes_only_present_fields() {
        let json = serde_json::to_string(&MeetingPatch::body("<p>x</p>")).unwrap();
        assert_eq!(json, r#"{"body":"<p>x</p>"}"#);
        assert!(MeetingPatch::default().is_empty());
    }

    #[test]
    fn test_meeting_deserializes_with_missing_optional_fields() {
        let json = r#"{
            "id": "m1",
            "start": "2024-01-01T10:00:00Z",
            "end": "2024-01-01T10:30:00Z"
        }"#;
        let m: Meeting = serde_json::from_str(json).unwrap();
        assert_eq!(m.title, "");
        assert!(m.body.is_none());
        assert!(m.join_link.is_none());
    }
}
