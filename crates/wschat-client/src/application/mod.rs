//! Application layer use cases for the chat client.
//!
//! - **`connection`** – The connection state machine.  `ChatSession` owns the
//!   channel handle, the local `Session`, and the heartbeat, and turns user
//!   intents and channel events into state transitions.
//!
//! - **`heartbeat`** – A cancellable periodic task that posts a tick to the
//!   event loop every interval while a connection is up.
//!
//! - **`router`** – Dispatches each decoded inbound message to the right
//!   handler by its `type`.
//!
//! - **`send_message`** – Validates and sends a private message, then echoes
//!   it locally.
//!
//! - **`presenter`** – The port through which the core pushes render commands
//!   to whatever UI is attached.
//!
//! - **`events`** – The event vocabulary and the single-actor event loop.

pub mod connection;
pub mod events;
pub mod heartbeat;
pub mod presenter;
pub mod router;
pub mod send_message;
