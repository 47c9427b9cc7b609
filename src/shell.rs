//! Line-oriented terminal front end
//!
//! Owns no client state: commands become runtime events and broadcast
//! events become printed lines.

use crate::runtime::{ClientEvent, HandleError, SessionHandle};
use crate::state_machine::{AppState, ChatTurn, ErrorScope, StagedFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

pub const HELP: &str = "\
Commands:
  /stage <file.pdf>...  select PDFs to upload (replaces the selection);
                        quote or backslash-escape paths with spaces
  /process              upload the selection and start a new conversation
  /status               show the session status
  /files                show selected and processed files
  /help                 show this help
  /quit                 exit
Anything else is sent as a question.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Stage(Vec<PathBuf>),
    Process,
    Status,
    Files,
    Help,
    Quit,
    Ask(String),
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown command '{0}' (try /help)")]
    UnknownCommand(String),
    #[error("Usage: /stage <file.pdf>...")]
    MissingPaths,
    #[error("Not a PDF: {}", .0.display())]
    NotPdf(PathBuf),
    #[error("Unbalanced quote in file list")]
    UnbalancedQuote,
}

/// Parse one input line
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let (name, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "stage" => parse_stage(args),
        "process" => Ok(Command::Process),
        "status" => Ok(Command::Status),
        "files" => Ok(Command::Files),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Split the file list shell-style so quoted or escaped spaces stay in the path
fn parse_stage(args: &str) -> Result<Command, ParseError> {
    let paths: Vec<PathBuf> = shell_words::split(args)
        .map_err(|_| ParseError::UnbalancedQuote)?
        .into_iter()
        .map(PathBuf::from)
        .collect();
    if paths.is_empty() {
        return Err(ParseError::MissingPaths);
    }
    if let Some(bad) = paths.iter().find(|p| !is_pdf(p)) {
        return Err(ParseError::NotPdf(bad.clone()));
    }
    Ok(Command::Stage(paths))
}

/// The picker's declared filter: PDFs only
fn is_pdf(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

// ============================================================================
// Rendering
// ============================================================================

/// Turns broadcast events into printable lines
#[derive(Default)]
pub struct Renderer {
    shown_turns: usize,
    last: Option<Arc<AppState>>,
}

impl Renderer {
    pub fn render(&mut self, event: &ClientEvent) -> Vec<String> {
        match event {
            ClientEvent::StateChanged { state } => {
                let turns = &state.conversation.turns;
                if turns.len() < self.shown_turns {
                    self.shown_turns = 0;
                }
                let lines: Vec<String> = turns
                    .iter()
                    .skip(self.shown_turns)
                    .flat_map(format_turn)
                    .collect();
                self.shown_turns = turns.len();
                self.last = Some(state.clone());
                lines
            }
            ClientEvent::SessionAdopted { session_id } => {
                let mut lines = vec![format!("Session: {session_id}")];
                if let Some(state) = &self.last {
                    lines.push(format!("Status: {}", state.status()));
                    if let Some(message) = state.session.as_ref().and_then(|s| s.message.as_ref()) {
                        lines.push(message.clone());
                    }
                    lines.extend(state.composer_hint());
                }
                lines
            }
            ClientEvent::Error { scope, message } => {
                let label = match scope {
                    ErrorScope::Intake => "process",
                    ErrorScope::Conversation => "chat",
                };
                vec![format!("[{label} error] {message}")]
            }
            ClientEvent::Rejected { reason } => vec![format!("! {reason}")],
        }
    }
}

fn format_turn(turn: &ChatTurn) -> Vec<String> {
    let time = turn.created_at().with_timezone(&chrono::Local).format("%H:%M:%S");
    let role = if turn.is_user() { "You" } else { "Assistant" };
    let mut lines = vec![format!("[{time}] {role}: {}", turn.content())];
    if !turn.sources().is_empty() {
        let sources: Vec<String> = turn
            .sources()
            .iter()
            .map(|s| format!("{} (page {})", s.source, s.page_label))
            .collect();
        lines.push(format!("  Sources: {}", sources.join(", ")));
    }
    lines
}

fn describe_status(state: &AppState) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", state.status())];
    match state.session_id() {
        Some(id) => lines.push(format!("Session: {id}")),
        None => lines.push("Process PDFs to start".to_string()),
    }
    lines.extend(state.composer_hint());
    if state.intake.busy {
        lines.push("Processing...".to_string());
    }
    if state.conversation.is_busy() {
        lines.push("Waiting for an answer...".to_string());
    }
    lines
}

fn describe_files(state: &AppState) -> Vec<String> {
    let mut lines = Vec::new();
    if state.intake.staged.is_empty() {
        lines.push("Selected: none".to_string());
    } else {
        lines.push(format!("Selected: {} file(s)", state.intake.staged.len()));
        lines.extend(state.intake.staged_names().into_iter().map(|n| format!("  {n}")));
    }
    if !state.processed_files().is_empty() {
        lines.push("Processed:".to_string());
        lines.extend(state.processed_files().iter().map(|f| format!("  {f}")));
    }
    lines
}

// ============================================================================
// Loop
// ============================================================================

/// Run the shell until `/quit` or end of input
pub async fn run(handle: SessionHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut events = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut renderer = Renderer::default();
        loop {
            match events.recv().await {
                Ok(event) => {
                    for line in renderer.render(&event) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Renderer fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&handle, command).await?,
            Err(e) => println!("{e}"),
        }
    }

    printer.abort();
    Ok(())
}

async fn execute(handle: &SessionHandle, command: Command) -> Result<(), HandleError> {
    let state = handle.snapshot();
    match command {
        Command::Stage(paths) => {
            let files: Vec<StagedFile> = paths.iter().map(StagedFile::from_path).collect();
            println!("{} file(s) selected", files.len());
            handle.stage(files).await?;
        }
        Command::Process => {
            if state.intake.busy {
                println!("Already processing");
            } else if state.intake.staged.is_empty() {
                println!("Choose PDF files first (/stage)");
            } else {
                println!("Processing...");
                handle.process().await?;
            }
        }
        Command::Ask(text) => {
            if state.session.is_none() {
                println!("Process PDFs to start");
            } else if state.conversation.is_busy() {
                println!("Still waiting for the previous answer");
            } else {
                handle.set_draft(text.as_str()).await?;
                handle.ask(text).await?;
            }
        }
        Command::Status => describe_status(&state).iter().for_each(|l| println!("{l}")),
        Command::Files => describe_files(&state).iter().for_each(|l| println!("{l}")),
        Command::Help => println!("{HELP}"),
        Command::Quit | Command::Empty => {}
    }
    Ok(())
}
