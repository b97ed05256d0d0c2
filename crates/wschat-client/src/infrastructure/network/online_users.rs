//! Online-user count over the server's REST API.
//!
//! `GET http://<host>/api/v1/ws/online-users` answers with
//!
//! ```json
//! {"code":200,"message":"success","data":{"users":[...],"count":2}}
//! ```
//!
//! Only `code == 200` responses are used.  Every failure (transport, non-2xx
//! status, bad JSON, other `code`) is logged and otherwise ignored.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::events::{ClientEvent, EventSender};
use crate::application::router::OnlineCountSource;

/// Success value of the response's `code` field.
const CODE_OK: i64 = 200;

/// Builds the count endpoint for `server_host`.
pub fn online_users_url(server_host: &str) -> String {
    format!("http://{server_host}/api/v1/ws/online-users")
}

#[derive(Debug, Error)]
pub enum CountError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with code {0}")]
    Rejected(i64),
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    code: i64,
    #[serde(default)]
    data: Option<CountData>,
}

#[derive(Debug, Deserialize)]
struct CountData {
    count: usize,
}

/// Extracts the count from a response body.
///
/// Returns `Ok(None)` when the body is well-formed but has no `data`.
///
/// # Errors
///
/// [`CountError::Rejected`] when `code` is not 200.
fn count_from(response: CountResponse) -> Result<Option<usize>, CountError> {
    if response.code != CODE_OK {
        return Err(CountError::Rejected(response.code));
    }
    Ok(response.data.map(|data| data.count))
}

/// Fetches the count and posts it to the event loop.
#[derive(Debug, Clone)]
pub struct HttpOnlineCount {
    client: Client,
    url: String,
    events: EventSender,
}

impl HttpOnlineCount {
    pub fn new(server_host: &str, events: EventSender) -> Self {
        Self {
            client: Client::new(),
            url: online_users_url(server_host),
            events,
        }
    }

    /// Performs one request.
    ///
    /// # Errors
    ///
    /// Returns [`CountError`] on transport failures, non-2xx statuses,
    /// undecodable bodies, or a `code` other than 200.
    pub async fn fetch(&self) -> Result<Option<usize>, CountError> {
        let response: CountResponse = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        count_from(response)
    }
}

impl OnlineCountSource for HttpOnlineCount {
    fn request_refresh(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            match this.fetch().await {
                Ok(Some(count)) => {
                    let _ = this.events.send(ClientEvent::OnlineCount(count));
                }
                Ok(None) => debug!("online-user response had no data"),
                Err(CountError::Rejected(code)) => {
                    debug!("online-user query rejected with code {code}")
                }
                Err(e) => warn!("online-user query to {} failed: {e}", this.url),
            }
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
