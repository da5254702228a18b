//! Meetnotes Server
//!
//! Stores meetings and their notes for the `meetnotes` CLI.
//!
//! # Configuration
//!
//! Environment variables:
//! - `MEETNOTES_PORT`: Port to listen on (default: 8080)
//! - `MEETNOTES_DATA_DIR`: Directory to store meetings (default: ~/.local/share/meetnotes-server)
//! - `MEETNOTES_SERVER_CONFIG`: Path to config file
//!   (default: ~/.config/meetnotes-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_tokens:
//!   - token: "your-secret-token-here"
//!     name: "laptop"
//! ```
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /meetings`: All meetings ordered by start time
//! - `POST /meetings`: Create a meeting
//! - `GET /meetings/{id}`: One meeting
//! - `PATCH /meetings/{id}`: Overwrite the title and/or body (last write wins)

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use meetnotes_core::{DocumentId, Meeting, MeetingPatch, NewMeeting};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// Configuration
// ============================================================================

/// API token entry in config
#[derive(Debug, Clone, Deserialize)]
struct ApiTokenEntry {
    token: String,
    name: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_tokens: Vec<ApiTokenEntry>,
}

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    /// Port to listen on
    port: u16,
    /// Directory holding meetings.json
    data_dir: PathBuf,
    /// Path to config file
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("MEETNOTES_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("MEETNOTES_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("meetnotes-server")
            });

        let config_path = std::env::var("MEETNOTES_SERVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("meetnotes-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Name of the client that authenticated, added to request extensions
#[derive(Debug, Clone)]
struct AuthClient {
    name: String,
}

/// Token store - maps token -> client
#[derive(Debug, Clone, Default)]
struct TokenStore {
    tokens: HashMap<String, AuthClient>,
}

impl TokenStore {
    /// Load API tokens from config file
    fn load(config_path: &FsPath) -> Self {
        let tokens = match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => Self::from_entries(config.api_tokens).tokens,
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                HashMap::new()
            }
        };

        if tokens.is_empty() {
            tracing::warn!("No API tokens loaded - all authenticated requests will fail");
        } else {
            tracing::info!("Loaded {} API token(s)", tokens.len());
        }
        Self { tokens }
    }

    fn from_entries(entries: Vec<ApiTokenEntry>) -> Self {
        let tokens = entries
            .into_iter()
            .map(|entry| (entry.token, AuthClient { name: entry.name }))
            .collect();
        Self { tokens }
    }

    /// Validate a token and return the associated client
    fn validate(&self, token: &str) -> Option<AuthClient> {
        self.tokens.get(token).cloned()
    }
}

/// Error response body
#[derive(Serialize)]
struct ApiError {
    error: &'static str,
    message: String,
}

fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Authentication middleware
async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(token) => token,
            None => {
                return error_response(
                    StatusCode::UNAUTHORIZED,
                    "invalid_auth",
                    "Authorization header must use Bearer scheme",
                );
            }
        },
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.tokens.validate(token) {
        Some(client) => {
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid API token"),
    }
}

// ============================================================================
// Storage
// ============================================================================

/// Meetings kept in memory and mirrored to `meetings.json`.
struct MeetingFile {
    path: PathBuf,
    meetings: RwLock<Vec<Meeting>>,
}

#[derive(Debug)]
enum StorageError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

impl MeetingFile {
    /// Opens `data_dir/meetings.json`, starting empty if it does not exist.
    async fn open(data_dir: &FsPath) -> Result<Self, StorageError> {
        let path = data_dir.join("meetings.json");
        let meetings = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            meetings: RwLock::new(meetings),
        })
    }

    async fn list(&self) -> Vec<Meeting> {
        let mut meetings = self.meetings.read().await.clone();
        meetings.sort_by_key(|m| m.start);
        meetings
    }

    async fn get(&self, id: &DocumentId) -> Option<Meeting> {
        self.meetings
            .read()
            .await
            .iter()
            .find(|m| &m.id == id)
            .cloned()
    }

    async fn create(&self, new_meeting: NewMeeting) -> Result<Meeting, StorageError> {
        let mut meeting = Meeting::new(
            DocumentId::generate(),
            new_meeting.title,
            new_meeting.start,
            new_meeting.end,
        );
        meeting.join_link = new_meeting.join_link;

        let mut meetings = self.meetings.write().await;
        meetings.push(meeting.clone());
        self.write(&meetings).await?;
        Ok(meeting)
    }

    /// Applies `patch`, returning the updated meeting or `None` if unknown.
    async fn update(
        &self,
        id: &DocumentId,
        patch: &MeetingPatch,
    ) -> Result<Option<Meeting>, StorageError> {
        let mut meetings = self.meetings.write().await;
        let Some(meeting) = meetings.iter_mut().find(|m| &m.id == id) else {
            return Ok(None);
        };
        meeting.apply(patch);
        let updated = meeting.clone();
        self.write(&meetings).await?;
        Ok(Some(updated))
    }

    /// Replaces the file through a temporary sibling so readers never see a
    /// partial write.
    async fn write(&self, meetings: &[Meeting]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(meetings)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    tokens: Arc<TokenStore>,
    meetings: Arc<MeetingFile>,
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn parse_id(id: &str) -> Result<DocumentId, Response> {
    DocumentId::parse(id)
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

fn storage_failure(e: StorageError) -> Response {
    tracing::error!("Storage failure: {}", e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage_error",
        "Failed to store meetings",
    )
}

fn not_found(id: &DocumentId) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("Meeting not found: {}", id),
    )
}

async fn list_meetings(State(state): State<AppState>) -> Json<Vec<Meeting>> {
    Json(state.meetings.list().await)
}

async fn get_meeting(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.meetings.get(&id).await {
        Some(meeting) => Json(meeting).into_response(),
        None => not_found(&id),
    }
}

async fn create_meeting(
    State(state): State<AppState>,
    Extension(client): Extension<AuthClient>,
    Json(new_meeting): Json<NewMeeting>,
) -> Response {
    if new_meeting.end < new_meeting.start {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_meeting",
            "Meeting cannot end before it starts",
        );
    }
    match state.meetings.create(new_meeting).await {
        Ok(meeting) => {
            tracing::info!(id = %meeting.id, client = %client.name, "meeting created");
            (StatusCode::CREATED, Json(meeting)).into_response()
        }
        Err(e) => storage_failure(e),
    }
}

async fn patch_meeting(
    State(state): State<AppState>,
    Extension(client): Extension<AuthClient>,
    Path(id): Path<String>,
    Json(patch): Json<MeetingPatch>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match state.meetings.update(&id, &patch).await {
        Ok(Some(meeting)) => {
            tracing::info!(
                %id,
                client = %client.name,
                title = patch.title.is_some(),
                body = patch.body.is_some(),
                "meeting updated"
            );
            Json(meeting).into_response()
        }
        Ok(None) => not_found(&id),
        Err(e) => storage_failure(e),
    }
}

/// Builds the router: `/health` is public, everything else needs a token.
fn app(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/meetings", get(list_meetings).post(create_meeting))
        .route("/meetings/{id}", get(get_meeting).patch(patch_meeting))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meetnotes_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Ensure data directory exists
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let meetings = match MeetingFile::open(&config.data_dir).await {
        Ok(meetings) => Arc::new(meetings),
        Err(e) => {
            tracing::error!("Failed to load meetings: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        tokens: Arc::new(TokenStore::load(&config.config_path)),
        meetings,
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    async fn test_state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let meetings = MeetingFile::open(dir.path()).await.unwrap();
        let state = AppState {
            tokens: Arc::new(TokenStore::from_entries(vec![ApiTokenEntry {
                token: TOKEN.to_string(),
                name: "tests".to_string(),
            }])),
            meetings: Arc::new(meetings),
        };
        (state, dir)
    }

    fn request(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(state: &AppState, title: &str, hour: u32) -> Meeting {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        let body = serde_json::json!({
            "title": title,
            "start": start,
            "end": start + chrono::Duration::minutes(30),
        });
        let response = app(state.clone())
            .oneshot(request("POST", "/meetings", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await
    }

    #[tokio::test]
    async fn test_health_needs_no_auth() {
        let (state, _dir) = test_state().await;
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_meetings_require_valid_token() {
        let (state, _dir) = test_state().await;

        let response = app(state.clone())
            .oneshot(Request::get("/meetings").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(state)
            .oneshot(
                Request::get("/meetings")
                    .header(header::AUTHORIZATION, "Bearer wrong")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_and_list_sorted_by_start() {
        let (state, _dir) = test_state().await;
        create(&state, "Afternoon", 14).await;
        create(&state, "Morning", 9).await;

        let response = app(state)
            .oneshot(request("GET", "/meetings", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let meetings: Vec<Meeting> = json_body(response).await;
        let titles: Vec<_> = meetings.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Morning", "Afternoon"]);
    }

    #[tokio::test]
    async fn test_patch_overwrites_fields_and_persists() {
        let (state, dir) = test_state().await;
        let created = create(&state, "Weekly", 10).await;

        let uri = format!("/meetings/{}", created.id);
        let patch = serde_json::json!({ "body": "<p>notes</p>" });
        let response = app(state.clone())
            .oneshot(request("PATCH", &uri, Some(patch)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let updated: Meeting = json_body(response).await;
        assert_eq!(updated.title, "Weekly");
        assert_eq!(updated.body.as_deref(), Some("<p>notes</p>"));

        // Survives a reload from disk
        let reopened = MeetingFile::open(dir.path()).await.unwrap();
        let stored = reopened.get(&created.id).await.unwrap();
        assert_eq!(stored.body_html(), "<p>notes</p>");
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_ids() {
        let (state, _dir) = test_state().await;

        let response = app(state.clone())
            .oneshot(request("GET", "/meetings/missing", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let patch = serde_json::json!({ "title": "x" });
        let response = app(state.clone())
            .oneshot(request("PATCH", "/meetings/missing", Some(patch)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app(state)
            .oneshot(request("GET", "/meetings/bad%20id", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_times() {
        let (state, _dir) = test_state().await;
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let body = serde_json::json!({
            "title": "Backwards",
            "start": start,
            "end": start - chrono::Duration::minutes(30),
        });
        let response = app(state)
            .oneshot(request("POST", "/meetings", Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
