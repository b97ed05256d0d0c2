//! Outbound send path for private messages.
//!
//! The sender does not wait for any server acknowledgement: as soon as the
//! channel accepts the frame, a `Sent` [`DisplayMessage`] is rendered locally
//! (optimistic echo).  If anything fails before that point the user sees an
//! error notice and no echo is created.

use chrono::Utc;
use tracing::{debug, warn};
use wschat_core::domain::session::{parse_target_user_id, validate_content};
use wschat_core::{DisplayMessage, ProtocolMessage, Severity};

use crate::application::connection::{ChatSession, ClientError, ConnectionState};

impl ChatSession {
    /// Sends `content` to the user with ID `target` and echoes it locally.
    ///
    /// Returns the echoed message.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotConnected`] unless the state is `Connected`.
    /// - [`ClientError::Validation`] for blank content or a bad target ID;
    ///   the channel is not touched.
    /// - [`ClientError::Channel`] / [`ClientError::Encode`] if the write
    ///   fails.
    ///
    /// Every error is also rendered as a notice.
    pub fn send_private_message(
        &mut self,
        target: &str,
        content: &str,
    ) -> Result<DisplayMessage, ClientError> {
        let from = match self.session() {
            Some(session) if self.state() == ConnectionState::Connected => session.user_id(),
            _ => return Err(self.report(ClientError::NotConnected)),
        };

        let content = match validate_content(content) {
            Ok(content) => content,
            Err(e) => return Err(self.report(e.into())),
        };
        let to = match parse_target_user_id(target) {
            Ok(to) => to,
            Err(e) => return Err(self.report(e.into())),
        };

        let msg = ProtocolMessage::private(from, to, content.clone());
        if let Err(e) = self.send(&msg) {
            warn!("private message to user {to} not sent: {e}");
            return Err(self.report(e));
        }

        let sent_at = msg.timestamp.unwrap_or_else(Utc::now);
        let echo = DisplayMessage::sent(from, to, content, sent_at);
        self.presenter().render_message(&echo);
        debug!("private message sent to user {to}");
        Ok(echo)
    }

    fn report(&self, error: ClientError) -> ClientError {
        let (text, severity) = match &error {
            ClientError::Validation(e) => (e.to_string(), Severity::Warning),
            ClientError::NotConnected => {
                ("connect to the server first".to_string(), Severity::Error)
            }
            other => (format!("failed to send message: {other}"), Severity::Error),
        };
        self.presenter().render_system_notice(&text, severity);
        error
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::connection::SessionConfig;
    use crate::application::events::{event_channel, EventReceiver};
    use crate::infrastructure::network::mock::{MockChannel, RecordingCountSource};
    use crate::infrastructure::ui_bridge::mock::RecordingPresenter;
    use wschat_core::{decode, Direction, Inbound, MessageBody, ValidationError};

    fn connected() -> (ChatSession, Arc<MockChannel>, Arc<RecordingPresenter>, EventReceiver) {
        let channel = Arc::new(MockChannel::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let (tx, rx) = event_channel();
        let mut session = ChatSession::new(
            SessionConfig::default(),
            channel.clone(),
            presenter.clone(),
            Arc::new(RecordingCountSource::new()),
            tx,
        );
        let id = session.connect("1", "alice").unwrap();
        session.on_channel_open(id);
        (session, channel, presenter, rx)
    }

    #[tokio::test]
    async fn test_send_private_message_writes_frame_and_echoes() {
        // Arrange
        let (mut session, channel, presenter, _rx) = connected();

        // Act
        let echo = session.send_private_message("2", "  hi  ").unwrap();

        // Assert
        assert_eq!(echo.from, Some(1));
        assert_eq!(echo.to, Some(2));
        assert_eq!(echo.content, "hi");
        assert_eq!(echo.direction, Direction::Sent);
        assert_eq!(presenter.messages(), vec![echo]);

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        let Inbound::Known(msg) = decode(&sent[0].1).unwrap() else {
            panic!("sent frame must decode");
        };
        assert_eq!(
            msg.body,
            MessageBody::Private {
                from_user_id: 1,
                to_user_id: 2,
                content: "hi".to_string(),
                data: None,
            }
        );
    }

    #[tokio::test]
    async fn test_blank_content_is_rejected_without_touching_channel() {
        let (mut session, channel, presenter, _rx) = connected();

        let result = session.send_private_message("2", "   ");

        assert!(matches!(
            result,
            Err(ClientError::Validation(ValidationError::EmptyContent))
        ));
        assert!(channel.sent().is_empty());
        assert!(presenter.messages().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_target_is_rejected_without_touching_channel() {
        let (mut session, channel, _presenter, _rx) = connected();

        for target in ["", "0", "bob"] {
            let result = session.send_private_message(target, "hi");
            assert!(matches!(result, Err(ClientError::Validation(_))), "{target:?}");
        }
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_channel_write_failure_reports_error_and_skips_echo() {
        // Arrange
        let (mut session, channel, presenter, _rx) = connected();
        channel.set_fail_send(true);

        // Act
        let result = session.send_private_message("2", "hi");

        // Assert
        assert!(matches!(result, Err(ClientError::Channel(_))));
        assert!(presenter.messages().is_empty());
        let notices = presenter.notices();
        let last = notices.last().unwrap();
        assert_eq!(last.1, Severity::Error);
        assert!(last.0.starts_with("failed to send message"));
    }

    #[test]
    fn test_send_while_idle_is_not_connected() {
        // Arrange
        let channel = Arc::new(MockChannel::new());
        let presenter = Arc::new(RecordingPresenter::new());
        let (tx, _rx) = event_channel();
        let mut session = ChatSession::new(
            SessionConfig::default(),
            channel.clone(),
            presenter.clone(),
            Arc::new(RecordingCountSource::new()),
            tx,
        );

        // Act
        let result = session.send_private_message("2", "hi");

        // Assert
        assert!(matches!(result, Err(ClientError::NotConnected)));
        assert!(channel.sent().is_empty());
        assert!(presenter.messages().is_empty());
    }
}
