//! Terminal bridge for the chat client.
//!
//! [`TerminalPresenter`] implements the `PresentationAdapter` port for a
//! line-oriented terminal: every render command prints one line to its writer
//! (stdout in the binary) and updates a [`ViewSnapshot`] that `/status` and
//! the tests read back.
//!
//! Anything that came from another user or the server is passed through
//! [`sanitize`] before printing so it cannot inject terminal control
//! sequences.

pub mod commands;
pub mod mock;

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use wschat_core::{Direction, DisplayMessage, OnlineUser, OnlineUserRoster, Severity};

use crate::application::connection::ConnectionState;
use crate::application::presenter::PresentationAdapter;

// ── View state ────────────────────────────────────────────────────────────────

/// Everything the UI currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub status: ConnectionState,
    pub input_enabled: bool,
    pub roster: Vec<OnlineUser>,
    pub online_count: usize,
    pub transcript: Vec<DisplayMessage>,
}

impl ViewSnapshot {
    /// One-line summary for `/status`.
    pub fn summary(&self) -> String {
        let names: Vec<String> = self
            .roster
            .iter()
            .map(|u| format!("{} ({})", sanitize(&u.username), u.user_id))
            .collect();
        format!(
            "status: {} | input: {} | online: {} [{}]",
            self.status,
            if self.input_enabled { "enabled" } else { "disabled" },
            self.online_count,
            names.join(", ")
        )
    }
}

// ── Terminal presenter ────────────────────────────────────────────────────────

/// Prints to a terminal and keeps a [`ViewSnapshot`].
pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
    view: Mutex<ViewSnapshot>,
}

impl TerminalPresenter {
    /// A presenter writing to stdout.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            view: Mutex::new(ViewSnapshot::default()),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Prints a line that is not part of the transcript (help, status).
    pub fn print_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("terminal write failed: {e}");
        }
    }

    fn update(&self, f: impl FnOnce(&mut ViewSnapshot)) {
        f(&mut self.view.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn format_message(&self, message: &DisplayMessage) -> String {
        let time = local_time(message.timestamp);
        let content = sanitize(&message.content);
        match message.direction {
            Direction::Sent => {
                let to = message.to.map(|id| id.to_string()).unwrap_or_default();
                format!("[{time}] you -> {to}: {content}")
            }
            Direction::Received => {
                let from = message
                    .from
                    .map(|id| self.display_name(id))
                    .unwrap_or_default();
                format!("[{time}] {from}: {content}")
            }
            Direction::System => format!("[{time}] {} {content}", marker(message.severity)),
        }
    }

    /// `name (id)` when the sender is on the roster, else just the id.
    fn display_name(&self, user_id: u64) -> String {
        let view = self.view.lock().unwrap_or_else(PoisonError::into_inner);
        match view.roster.iter().find(|u| u.user_id == user_id) {
            Some(user) => format!("{} ({user_id})", sanitize(&user.username)),
            None => user_id.to_string(),
        }
    }
}

impl PresentationAdapter for TerminalPresenter {
    fn render_message(&self, message: &DisplayMessage) {
        let line = self.format_message(message);
        self.update(|view| view.transcript.push(message.clone()));
        self.print_line(&line);
    }

    fn render_system_notice(&self, text: &str, severity: Severity) {
        self.render_message(&DisplayMessage::system(text, severity));
    }

    fn set_connection_status(&self, state: ConnectionState) {
        debug!("status -> {state}");
        self.update(|view| view.status = state);
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.update(|view| view.input_enabled = enabled);
    }

    fn render_roster(&self, roster: &OnlineUserRoster) {
        self.update(|view| view.roster = roster.users().to_vec());
        let names: Vec<String> = roster
            .users()
            .iter()
            .map(|u| format!("{} ({})", sanitize(&u.username), u.user_id))
            .collect();
        self.print_line(&format!("-- online: {}", names.join(", ")));
    }

    fn set_online_count(&self, count: usize) {
        self.update(|view| view.online_count = count);
        self.print_line(&format!("-- {count} online"));
    }
}

// ── Formatting helpers ────────────────────────────────────────────────────────

/// Replaces control characters so remote text cannot drive the terminal.
/// Tabs become spaces; everything else becomes U+FFFD.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if c.is_control() => char::REPLACEMENT_CHARACTER,
            c => c,
        })
        .collect()
}

/// `HH:MM:SS` in the local time zone.
pub fn local_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M:%S").to_string()
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "--",
        Severity::Warning => "!!",
        Severity::Error => "!!!",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
