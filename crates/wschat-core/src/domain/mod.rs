//! Domain entities for a chat session.
//!
//! - [`session`] – the local participant and validation of user input.
//! - [`display`] – UI-facing projections of chat traffic.
//! - [`roster`] – the list of online users last reported by the server.

pub mod display;
pub mod roster;
pub mod session;

pub use display::{Direction, DisplayMessage, Severity};
pub use roster::{OnlineUser, OnlineUserRoster};
pub use session::{Session, UserId, ValidationError};
