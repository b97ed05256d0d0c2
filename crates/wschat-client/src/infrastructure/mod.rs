//! Infrastructure layer for the chat client.
//!
//! - **`network`** – WebSocket implementation of the `ChatChannel` port and
//!   the REST online-count collaborator.
//! - **`ui_bridge`** – Terminal implementation of the `PresentationAdapter`
//!   port and the stdin command parser.
//! - **`storage`** – TOML configuration file.

pub mod network;
pub mod storage;
pub mod ui_bridge;
