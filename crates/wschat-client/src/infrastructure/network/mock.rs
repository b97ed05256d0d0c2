//! In-memory doubles for the network ports.
//!
//! [`MockChannel`] records every open, write and close instead of touching a
//! socket, and can be told to fail.  Channel events are not generated: tests
//! post `ChannelEvent`s to the session themselves, which keeps the order of
//! events under the test's control.
//!
//! ```ignore
//! let channel = Arc::new(MockChannel::new());
//! let mut session = ChatSession::new(config, channel.clone(), presenter, counts, tx);
//!
//! let id = session.connect("1", "alice").unwrap();
//! session.handle_event(ClientEvent::Channel { channel: id, event: ChannelEvent::Opened });
//! session.send_private_message("2", "hi").unwrap();
//!
//! assert_eq!(channel.sent().len(), 1);
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::connection::{ChannelError, ChannelId, ChatChannel};
use crate::application::router::OnlineCountSource;

/// A channel that records calls.  Writable by default.
#[derive(Debug)]
pub struct MockChannel {
    /// `(channel, target)` for every `open` call, including failed ones.
    pub opens: Mutex<Vec<(ChannelId, String)>>,
    /// `(channel, text)` for every accepted `send_text`.
    pub frames: Mutex<Vec<(ChannelId, String)>>,
    /// Every `close` call.
    pub closes: Mutex<Vec<ChannelId>>,
    fail_open: AtomicBool,
    fail_send: AtomicBool,
    writable: AtomicBool,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self {
            opens: Mutex::new(Vec::new()),
            frames: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
            fail_open: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            writable: AtomicBool::new(true),
        }
    }
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `open` fail with [`ChannelError::Open`].
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Makes `send_text` fail with [`ChannelError::WriterClosed`].
    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Controls what `is_writable` reports.
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    pub fn opened(&self) -> Vec<(ChannelId, String)> {
        self.opens.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(ChannelId, String)> {
        self.frames.lock().unwrap().clone()
    }

    /// Only the text of every accepted frame.
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn closed(&self) -> Vec<ChannelId> {
        self.closes.lock().unwrap().clone()
    }
}

impl ChatChannel for MockChannel {
    fn open(&self, target: &str, channel: ChannelId) -> Result<(), ChannelError> {
        self.opens.lock().unwrap().push((channel, target.to_string()));
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(ChannelError::Open("mock open failure".to_string()));
        }
        Ok(())
    }

    fn send_text(&self, channel: ChannelId, text: String) -> Result<(), ChannelError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ChannelError::WriterClosed);
        }
        self.frames.lock().unwrap().push((channel, text));
        Ok(())
    }

    fn close(&self, channel: ChannelId) {
        self.closes.lock().unwrap().push(channel);
    }

    fn is_writable(&self, _channel: ChannelId) -> bool {
        self.writable.load(Ordering::SeqCst)
    }
}

/// Counts refresh requests without doing any I/O.
#[derive(Debug, Default)]
pub struct RecordingCountSource {
    requests: AtomicUsize,
}

impl RecordingCountSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl OnlineCountSource for RecordingCountSource {
    fn request_refresh(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}
