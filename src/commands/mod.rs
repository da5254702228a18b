mod agenda;
mod config_cmd;
mod meeting;
mod notes;

use clap::ValueEnum;
use meetnotes_core::{HttpMeetingStore, PersistError, SessionToken};

use crate::config::Config;

pub use agenda::AgendaCommand;
pub use config_cmd::ConfigCommand;
pub use meeting::MeetingCommand;
pub use notes::NotesCommand;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Client and token for the configured server, once it answers its health
/// check.
pub(crate) async fn connect(
    config: &Config,
) -> Result<(HttpMeetingStore, SessionToken), Box<dyn std::error::Error>> {
    if !config.is_configured() {
        return Err(PersistError::NotConfigured.into());
    }
    let store = config.meeting_store()?;
    let token = config.session_token()?;

    // Fail fast instead of waiting on every request
    if !store.check_server().await {
        return Err(format!("Server unreachable at {}", store.server_url()).into());
    }
    Ok((store, token))
}
