//! wschat-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does wschat-client do?
//!
//! The client holds one WebSocket channel to a chat server on behalf of a
//! single local user and mirrors what happens on that channel into a
//! line-oriented terminal UI.
//!
//! 1. The user types `/connect <user_id> <username>`; the client validates
//!    the input and opens `ws://<host>/ws?user_id=..&username=..`.
//! 2. Once the channel opens, a heartbeat (`{"type":"heartbeat","content":"ping"}`)
//!    is sent every 30 seconds for as long as the connection stays up.
//! 3. Inbound JSON messages are decoded and routed: private messages are
//!    printed, `user_list` replaces the online roster, `join`/`leave` print a
//!    notice and refresh the online count over REST.
//! 4. `/send <target> <text>` (or `@<target> <text>`) sends a private message
//!    and echoes it locally as soon as the channel accepts it.
//!
//! All state lives in a single [`ChatSession`](application::connection::ChatSession)
//! driven by one event loop; network tasks and timers only post events to it.

/// Application layer: connection state machine, heartbeat, routing, send path.
pub mod application;

/// Infrastructure layer: WebSocket and REST adapters, terminal UI, config file.
pub mod infrastructure;
