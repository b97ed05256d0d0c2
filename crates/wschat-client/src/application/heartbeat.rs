//! Heartbeat scheduler.
//!
//! While a connection is up, a spawned task posts
//! [`ClientEvent::HeartbeatTick`] to the event loop once per interval.  The
//! task itself never writes to the channel: the event loop decides at firing
//! time whether the channel is still writable and either sends the `ping` or
//! skips the tick.
//!
//! `start` and `stop` are idempotent, and dropping the scheduler stops it, so
//! the timer can never outlive the connection that owns it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::application::connection::ChannelId;
use crate::application::events::{ClientEvent, EventSender};

/// Default keep-alive period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic tick source bound to one channel.
#[derive(Debug)]
pub struct HeartbeatScheduler {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl HeartbeatScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// Starts ticking for `channel`.  The first tick fires one full period
    /// after this call.
    ///
    /// Returns `false` (and changes nothing) if already running.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, channel: ChannelId, events: EventSender) -> bool {
        if self.is_running() {
            return false;
        }

        let period = self.period;
        let first_tick = Instant::now() + period;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(ClientEvent::HeartbeatTick { channel }).is_err() {
                    // Event loop is gone.
                    break;
                }
            }
        }));
        debug!("heartbeat started for channel {channel} every {period:?}");
        true
    }

    /// Cancels the periodic task.  Returns `true` if it was running; calling
    /// it again is a no-op.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                debug!("heartbeat stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
