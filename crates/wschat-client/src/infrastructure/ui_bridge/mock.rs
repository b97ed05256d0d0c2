//! Recording presentation adapter for tests.
//!
//! Every render command is pushed into a `Mutex<Vec<PresenterCall>>` in call
//! order so assertions can check both what was shown and the sequence.

use std::sync::Mutex;

use wschat_core::{DisplayMessage, OnlineUserRoster, Severity};

use crate::application::connection::ConnectionState;
use crate::application::presenter::PresentationAdapter;

/// One call made on the presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    Message(DisplayMessage),
    Notice(String, Severity),
    Status(ConnectionState),
    InputEnabled(bool),
    Roster(OnlineUserRoster),
    OnlineCount(usize),
}

/// A presenter that records calls and draws nothing.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub calls: Mutex<Vec<PresenterCall>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Rendered chat messages, in order.
    pub fn messages(&self) -> Vec<DisplayMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Message(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// System notices `(text, severity)`, in order.
    pub fn notices(&self) -> Vec<(String, Severity)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Notice(text, severity) => Some((text, severity)),
                _ => None,
            })
            .collect()
    }

    /// Connection states reported, in order.
    pub fn statuses(&self) -> Vec<ConnectionState> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PresenterCall::Status(state) => Some(state),
                _ => None,
            })
            .collect()
    }

    /// The most recent online count, if any was set.
    pub fn last_online_count(&self) -> Option<usize> {
        self.calls().into_iter().rev().find_map(|call| match call {
            PresenterCall::OnlineCount(count) => Some(count),
            _ => None,
        })
    }

    fn record(&self, call: PresenterCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PresentationAdapter for RecordingPresenter {
    fn render_message(&self, message: &DisplayMessage) {
        self.record(PresenterCall::Message(message.clone()));
    }

    fn render_system_notice(&self, text: &str, severity: Severity) {
        self.record(PresenterCall::Notice(text.to_string(), severity));
    }

    fn set_connection_status(&self, state: ConnectionState) {
        self.record(PresenterCall::Status(state));
    }

    fn set_input_enabled(&self, enabled: bool) {
        self.record(PresenterCall::InputEnabled(enabled));
    }

    fn render_roster(&self, roster: &OnlineUserRoster) {
        self.record(PresenterCall::Roster(roster.clone()));
    }

    fn set_online_count(&self, count: usize) {
        self.record(PresenterCall::OnlineCount(count));
    }
}
