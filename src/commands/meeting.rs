use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use clap::{Args, Subcommand};

use meetnotes_core::format::{duration_minutes, format_date, format_time_range};
use meetnotes_core::{DocumentId, Meeting, NewMeeting};

use super::{connect, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct MeetingCommand {
    #[command(subcommand)]
    pub command: MeetingSubcommand,
}

#[derive(Subcommand)]
pub enum MeetingSubcommand {
    /// Schedule a new meeting
    Create {
        /// Meeting title
        title: String,

        /// Start time (RFC 3339 or "YYYY-MM-DD HH:MM" local time)
        #[arg(long, short)]
        start: String,

        /// Length in minutes
        #[arg(long, short, default_value = "30")]
        minutes: i64,

        /// Video call link
        #[arg(long)]
        link: Option<String>,
    },

    /// Show a meeting with its notes
    Show {
        /// Meeting ID
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl MeetingCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let (store, token) = connect(config).await?;

        match &self.command {
            MeetingSubcommand::Create {
                title,
                start,
                minutes,
                link,
            } => {
                if *minutes <= 0 {
                    return Err("Meeting length must be positive".into());
                }
                let start = parse_datetime(start)?;
                let new_meeting = NewMeeting {
                    title: title.clone(),
                    start,
                    end: start + Duration::minutes(*minutes),
                    join_link: link.clone(),
                };

                let created = store.create_meeting(&token, &new_meeting).await?;
                println!("Created meeting:");
                print!("{}", render_meeting(&created));
                Ok(())
            }

            MeetingSubcommand::Show { id, format } => {
                let id = DocumentId::parse(id)?;
                let meeting = store.get_meeting(&token, &id).await?;
                match format {
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&meeting)?),
                    OutputFormat::Text => print!("{}", render_meeting(&meeting)),
                }
                Ok(())
            }
        }
    }
}

/// Parses RFC 3339, falling back to a local "YYYY-MM-DD HH:MM".
pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").map_err(|_| {
        format!(
            "Invalid time '{}'. Use RFC 3339 or \"YYYY-MM-DD HH:MM\".",
            s
        )
    })?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Time '{}' does not exist in the local time zone", s))
}

/// Header block shown for a meeting, in local time.
pub(crate) fn render_meeting(meeting: &Meeting) -> String {
    let mut out = String::new();
    let title = if meeting.title.is_empty() {
        "Untitled"
    } else {
        meeting.title.as_str()
    };
    out.push_str(&format!("{}\n", title));
    out.push_str(&format!("{}\n", "=".repeat(title.chars().count())));
    out.push_str(&format!("ID: {}\n", meeting.id));
    out.push_str(&format!(
        "Date: {}\n",
        format_date(&meeting.start.with_timezone(&Local))
    ));
    out.push_str(&format!(
        "Time: {} ({} min)\n",
        format_time_range(&meeting.start, &meeting.end, &Local),
        duration_minutes(&meeting.start, &meeting.end)
    ));
    if let Some(link) = &meeting.join_link {
        out.push_str(&format!("Join: {}\n", link));
    }
    out.push_str(&format!("\n{}\n", meeting.body_html()));
    out
}
