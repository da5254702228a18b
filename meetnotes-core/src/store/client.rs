//! HTTP client for the meetnotes server.
//!
//! Talks JSON over plain HTTP(S) with a Bearer token:
//! - `GET /meetings` lists meetings
//! - `GET /meetings/{id}` fetches one meeting
//! - `POST /meetings` creates a meeting
//! - `PATCH /meetings/{id}` overwrites title and/or body

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{MeetingStore, PersistError, SessionToken};
use crate::document_id::DocumentId;
use crate::models::{Meeting, MeetingPatch};

/// Payload for creating a meeting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMeeting {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_link: Option<String>,
}

/// Meeting store backed by the meetnotes server.
#[derive(Debug, Clone)]
pub struct HttpMeetingStore {
    server_url: String,
    http: reqwest::Client,
}

impl HttpMeetingStore {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Returns the server URL.
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Returns true if the server answers its health check.
    pub async fn check_server(&self) -> bool {
        match self.http.get(self.build_http_url("/health")).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    pub async fn list_meetings(&self, token: &SessionToken) -> Result<Vec<Meeting>, PersistError> {
        let request = self.http.get(self.build_http_url("/meetings"));
        let response = send(request, token).await?;
        let response = check_status(response, None)?;
        response
            .json()
            .await
            .map_err(|e| PersistError::HttpError(e.to_string()))
    }

    pub async fn get_meeting(
        &self,
        token: &SessionToken,
        id: &DocumentId,
    ) -> Result<Meeting, PersistError> {
        let request = self
            .http
            .get(self.build_http_url(&format!("/meetings/{}", id)));
        let response = send(request, token).await?;
        let response = check_status(response, Some(id))?;
        response
            .json()
            .await
            .map_err(|e| PersistError::HttpError(e.to_string()))
    }

    pub async fn create_meeting(
        &self,
        token: &SessionToken,
        meeting: &NewMeeting,
    ) -> Result<Meeting, PersistError> {
        let request = self
            .http
            .post(self.build_http_url("/meetings"))
            .json(meeting);
        let response = send(request, token).await?;
        let response = check_status(response, None)?;
        response
            .json()
            .await
            .map_err(|e| PersistError::HttpError(e.to_string()))
    }

    async fn patch_meeting(
        &self,
        token: &SessionToken,
        patch: &MeetingPatch,
        id: &DocumentId,
    ) -> Result<(), PersistError> {
        let request = self
            .http
            .patch(self.build_http_url(&format!("/meetings/{}", id)))
            .json(patch);
        let response = send(request, token).await?;
        check_status(response, Some(id))?;
        Ok(())
    }

    /// Builds an HTTP URL for a given path.
    fn build_http_url(&self, path: &str) -> String {
        let base_url = if !self.server_url.starts_with("http://")
            && !self.server_url.starts_with("https://")
        {
            format!("http://{}", self.server_url)
        } else {
            self.server_url.clone()
        };

        format!("{}{}", base_url.trim_end_matches('/'), path)
    }
}

impl MeetingStore for HttpMeetingStore {
    fn update_meeting<'a>(
        &'a self,
        token: &'a SessionToken,
        patch: &'a MeetingPatch,
        id: &'a DocumentId,
    ) -> BoxFuture<'a, Result<(), PersistError>> {
        Box::pin(self.patch_meeting(token, patch, id))
    }
}

async fn send(request: RequestBuilder, token: &SessionToken) -> Result<Response, PersistError> {
    request
        .bearer_auth(token.as_str())
        .send()
        .await
        .map_err(|e| PersistError::HttpError(e.to_string()))
}

fn check_status(response: Response, id: Option<&DocumentId>) -> Result<Response, PersistError> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PersistError::Unauthorized),
        StatusCode::NOT_FOUND => match id {
            Some(id) => Err(PersistError::NotFound(id.clone())),
            None => Err(PersistError::Status(404)),
        },
        status => Err(PersistError::Status(status.as_u16())),
    }
}
