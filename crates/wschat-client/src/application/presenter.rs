//! Presentation adapter port.
//!
//! The core never draws anything itself.  It pushes render commands through
//! this trait and the attached UI decides how they look.  The terminal
//! implementation lives in `infrastructure::ui_bridge`; tests use the
//! recording implementation next to it.

use wschat_core::{DisplayMessage, OnlineUserRoster, Severity};

use crate::application::connection::ConnectionState;

/// Render commands the core issues to the UI.
///
/// Implementations are called from the event loop only, one call at a time,
/// and must not block for long.
pub trait PresentationAdapter: Send + Sync {
    /// Appends a chat message (sent or received) to the transcript.
    fn render_message(&self, message: &DisplayMessage);

    /// Appends a system notice to the transcript.
    fn render_system_notice(&self, text: &str, severity: Severity);

    /// Shows the current connection state.
    fn set_connection_status(&self, state: ConnectionState);

    /// Enables or disables message input.
    fn set_input_enabled(&self, enabled: bool);

    /// Replaces the displayed online-user list.
    fn render_roster(&self, roster: &OnlineUserRoster);

    /// Shows the number of users online.
    fn set_online_count(&self, count: usize);
}
