//! Parser for lines typed at the terminal.
//!
//! | input                          | result                       |
//! |--------------------------------|------------------------------|
//! | `/connect <user_id> <username>`| `UserIntent::Connect`        |
//! | `/disconnect`                  | `UserIntent::Disconnect`     |
//! | `/send <target> <text>`        | `UserIntent::SendPrivate`    |
//! | `/msg <target> <text>`         | same as `/send`              |
//! | `@<target> <text>`             | same as `/send`              |
//! | `/status`                      | `Command::Status`            |
//! | `/help`                        | `Command::Help`              |
//! | `/quit`                        | `UserIntent::Quit`           |
//!
//! The parser only splits the line.  User IDs and message text are passed on
//! raw; validating them is the session's job so the same rules apply however
//! the intent was produced.

use thiserror::Error;

use crate::application::events::UserIntent;

/// Text printed for `/help`.
pub const HELP: &str = "\
commands:
  /connect <user_id> <username>   connect to the chat server
  /disconnect                     close the connection
  /send <user_id> <text>          send a private message (alias /msg)
  @<user_id> <text>               same as /send
  /status                         show connection state and online users
  /help                           show this help
  /quit                           exit";

/// A parsed terminal line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forward to the event loop.
    Intent(UserIntent),
    /// Print the current view state.
    Status,
    /// Print [`HELP`].
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command /{0} (try /help)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("messages need a recipient: @<user_id> <text> or /send <user_id> <text>")]
    NoRecipient,
}

/// Parses one line.  Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands, missing arguments, or
/// plain text without a recipient.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(rest) = line.strip_prefix('@') {
        let (target, content) = split_first(rest);
        if target.is_empty() {
            return Err(CommandError::Usage("@<user_id> <text>"));
        }
        return Ok(Some(send(target, content)));
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Err(CommandError::NoRecipient);
    };
    let (name, args) = split_first(rest);

    let command = match name {
        "connect" => {
            let (user_id, username) = split_first(args);
            if user_id.is_empty() || username.is_empty() {
                return Err(CommandError::Usage("/connect <user_id> <username>"));
            }
            Command::Intent(UserIntent::Connect {
                user_id: user_id.to_string(),
                username: username.to_string(),
            })
        }
        "disconnect" => Command::Intent(UserIntent::Disconnect),
        "send" | "msg" => {
            let (target, content) = split_first(args);
            if target.is_empty() {
                return Err(CommandError::Usage("/send <user_id> <text>"));
            }
            send(target, content)
        }
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Intent(UserIntent::Quit),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn send(target: &str, content: &str) -> Command {
    Command::Intent(UserIntent::SendPrivate {
        target: target.to_string(),
        content: content.to_string(),
    })
}

/// Splits off the first whitespace-delimited word; the remainder is trimmed.
fn split_first(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (s, ""),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
