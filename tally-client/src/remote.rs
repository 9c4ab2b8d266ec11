//! HTTP client for the real server.
//!
//! Every failure is classified by whether the server answered at all:
//! [`RemoteError::Transport`] means no HTTP response arrived and the caller
//! may fall back to another store; everything else means the server was
//! reached and its answer stands.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use tally_core::{Counter, Credential, Session, UserProfile};

/// Error body the server attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Successful auth payload: `{token, user}`.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    user: UserProfile,
}

/// Acknowledgement of a replace-sync: `{success, count}`.
#[derive(Debug, Deserialize)]
struct SyncResponse {
    #[allow(dead_code)]
    success: bool,
    count: usize,
}

#[derive(Debug, Error)]
pub enum RemoteError {
    /// No HTTP response arrived (refused, unreachable, timed out).
    #[error("transport: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("{message} ({status})")]
    Rejected { status: StatusCode, message: String },

    /// A success response carried a body that did not parse.
    #[error("decode: {0}")]
    Decode(String),
}

/// Client for the server's auth and counters endpoints.
#[derive(Debug, Clone)]
pub struct RemoteApi {
    base_url: String,
    http: reqwest::Client,
}

impl RemoteApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Turn a non-2xx response into a rejection, preferring the server's
    /// own `{error}` message when the body carries one.
    async fn rejection(response: reqwest::Response) -> RemoteError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body
                }
            });
        RemoteError::Rejected { status, message }
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let url = format!("{}/auth/register", self.base_url);
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Session {
            user: auth.user,
            credential: Credential::real(auth.token),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session, RemoteError> {
        let url = format!("{}/auth/login", self.base_url);
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(Session {
            user: auth.user,
            credential: Credential::real(auth.token),
        })
    }

    /// Fetch the caller's full collection.
    pub async fn fetch_counters(&self, token: &str) -> Result<Vec<Counter>, RemoteError> {
        let url = format!("{}/counters", self.base_url);

        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        response
            .json::<Vec<Counter>>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// Push the caller's full collection (replace semantics server-side).
    /// Returns the number of counters the server now stores.
    pub async fn sync_counters(
        &self,
        token: &str,
        counters: &[Counter],
    ) -> Result<usize, RemoteError> {
        let url = format!("{}/counters/sync", self.base_url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&counters)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let ack: SyncResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(ack.count)
    }
}
