use chrono::{Local, NaiveDate};
use clap::Args;

use meetnotes_core::{agenda_for, AgendaItem};

use super::{connect, OutputFormat};
use crate::config::Config;

#[derive(Args)]
pub struct AgendaCommand {
    /// Date (YYYY-MM-DD), defaults to today
    #[arg(long, short)]
    pub date: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl AgendaCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let date = match &self.date {
            Some(date) => parse_date(date)?,
            None => Local::now().date_naive(),
        };

        let (store, token) = connect(config).await?;
        let meetings = store.list_meetings(&token).await?;
        tracing::debug!(count = meetings.len(), %date, "fetched meetings");

        let items = agenda_for(&meetings, date);
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
            OutputFormat::Text => print!("{}", render_agenda(&items)),
        }
        Ok(())
    }
}

pub(crate) fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", date))
}

fn render_agenda(items: &[AgendaItem]) -> String {
    if items.is_empty() {
        return "No agenda items\n".to_string();
    }

    let mut out = String::new();
    for item in items {
        out.push_str(&format!("{}\n", item.title));
        out.push_str(&format!(
            "  {}, {} min\n",
            item.time_range, item.duration_minutes
        ));
        if let Some(link) = &item.link {
            out.push_str(&format!("  Join: {}\n", link));
        }
        out.push('\n');
    }
    out
}
