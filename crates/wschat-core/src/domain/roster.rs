//! Online-user roster.
//!
//! The server pushes the complete list in every `user_list` message, so the
//! roster is only ever replaced wholesale; there is no incremental diffing.

use serde::{Deserialize, Serialize};

use crate::domain::session::UserId;

/// A user the server reports as online.
///
/// The server sends more attributes (avatar, status, last seen); they are
/// ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUser {
    pub user_id: UserId,
    pub username: String,
}

impl OnlineUser {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Ordered list of online users as last reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUserRoster {
    users: Vec<OnlineUser>,
}

impl OnlineUserRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole roster, preserving the server's order.
    pub fn replace(&mut self, users: Vec<OnlineUser>) {
        self.users = users;
    }

    pub fn users(&self) -> &[OnlineUser] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Looks up a user by ID.
    pub fn find(&self, user_id: UserId) -> Option<&OnlineUser> {
        self.users.iter().find(|user| user.user_id == user_id)
    }
}

impl From<Vec<OnlineUser>> for OnlineUserRoster {
    fn from(users: Vec<OnlineUser>) -> Self {
        Self { users }
    }
}
