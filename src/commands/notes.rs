use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use meetnotes_core::{BodyEditor, DocumentId, EnterOutcome, NotesSession, TitleInput, EMPTY_BODY};

use super::connect;
use crate::config::Config;

/// How long `:quit` waits for outstanding saves.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Args)]
pub struct NotesCommand {
    /// Meeting ID
    pub id: String,
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum NotesInput {
    Title(String),
    TitleBreak(usize),
    Enter,
    Open(String),
    Show,
    Status,
    Save,
    Quit,
    Text(String),
}

impl NotesCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let id = DocumentId::parse(&self.id)?;
        let (store, token) = connect(config).await?;
        let store = Arc::new(store);

        let meeting = store.get_meeting(&token, &id).await?;

        let mut session = NotesSession::new(store.clone(), token.clone())
            .with_save_delay(config.save_delay())
            .with_body_editor(Box::new(TerminalBody))
            .with_title_input(Box::new(TerminalTitle::default()));
        session.present(meeting);
        print_help();

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                Some(event) = session.next_event() => {
                    session.handle_event(event);
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    let input = match parse_input(&line) {
                        Ok(input) => input,
                        Err(e) => {
                            eprintln!("{}", e);
                            continue;
                        }
                    };
                    match input {
                        NotesInput::Quit => break,
                        NotesInput::Title(title) => session.set_title(title),
                        NotesInput::TitleBreak(cursor) => {
                            session.title_enter(cursor, true);
                        }
                        NotesInput::Enter => {
                            if session.title_enter(0, false) == EnterOutcome::Ignored {
                                eprintln!("No body editor");
                            }
                        }
                        NotesInput::Open(id) => match DocumentId::parse(&id) {
                            Ok(id) => match store.get_meeting(&token, &id).await {
                                Ok(meeting) => session.present(meeting),
                                Err(e) => eprintln!("Error: {}", e),
                            },
                            Err(e) => eprintln!("Error: {}", e),
                        },
                        NotesInput::Show => {
                            if let Some(doc) = session.document() {
                                println!("{}", doc.pending_title());
                                println!("{}", doc.pending_body());
                            }
                        }
                        NotesInput::Status => println!("{}", session.status()),
                        NotesInput::Save => {
                            let started = session.save_now();
                            tracing::debug!(started, "manual save");
                        }
                        NotesInput::Text(text) => {
                            let body = session
                                .document()
                                .map(|doc| append_paragraph(doc.pending_body(), &text));
                            if let Some(body) = body {
                                session.set_body(body);
                            }
                        }
                    }
                }
            }
        }

        session.save_now();
        if tokio::time::timeout(FLUSH_TIMEOUT, session.settle())
            .await
            .is_err()
        {
            eprintln!("Timed out waiting for saves to finish");
        }
        println!("{}", session.status());
        Ok(())
    }
}

fn print_help() {
    eprintln!("Type to append a paragraph. Commands:");
    eprintln!("  :title <text>   rename the meeting");
    eprintln!("  :title+ <pos>   insert a line break in the title at <pos>");
    eprintln!("  :enter          move from the title to the notes");
    eprintln!("  :open <id>      switch to another meeting");
    eprintln!("  :show           print the current title and notes");
    eprintln!("  :status         show save status");
    eprintln!("  :save           save now");
    eprintln!("  :quit           save and exit");
}

pub(crate) fn parse_input(line: &str) -> Result<NotesInput, String> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(NotesInput::Text(line.to_string()));
    };
    let (name, arg) = match command.split_once(' ') {
        Some((name, arg)) => (name, arg),
        None => (command, ""),
    };

    match name {
        "title" => Ok(NotesInput::Title(arg.to_string())),
        "title+" => arg
            .trim()
            .parse()
            .map(NotesInput::TitleBreak)
            .map_err(|_| format!("Invalid cursor position '{}'", arg.trim())),
        "enter" => Ok(NotesInput::Enter),
        "open" if !arg.trim().is_empty() => Ok(NotesInput::Open(arg.trim().to_string())),
        "open" => Err("Usage: :open <meeting-id>".to_string()),
        "show" => Ok(NotesInput::Show),
        "status" => Ok(NotesInput::Status),
        "save" => Ok(NotesInput::Save),
        "quit" | "q" => Ok(NotesInput::Quit),
        other => Err(format!("Unknown command ':{}'", other)),
    }
}

/// Appends `text` to `body` as an escaped paragraph. Blank text leaves the
/// body unchanged and the empty placeholder paragraph is replaced.
pub(crate) fn append_paragraph(body: &str, text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return body.to_string();
    }
    let paragraph = format!("<p>{}</p>", escape_html(text));
    if body.is_empty() || body == EMPTY_BODY {
        paragraph
    } else {
        format!("{}{}", body, paragraph)
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Body editor that echoes to the terminal.
struct TerminalBody;

impl BodyEditor for TerminalBody {
    fn set_content(&mut self, html: &str) {
        println!("{}", html);
    }

    fn focus(&mut self) {
        eprintln!("-- notes --");
    }

    fn set_cursor_position(&mut self, offset: usize) {
        tracing::trace!(offset, "body cursor moved");
    }
}

#[derive(Default)]
struct TerminalTitle {
    rows: usize,
}

impl TitleInput for TerminalTitle {
    fn resize_to_fit(&mut self, rows: usize) {
        if rows != self.rows {
            self.rows = rows;
            tracing::debug!(rows, "title resized");
        }
    }

    fn set_cursor_position(&mut self, offset: usize) {
        eprintln!("-- title, cursor at {} --", offset);
    }
}
