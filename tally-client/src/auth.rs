//! Auth gateway: one contract, two interchangeable backends.
//!
//! The real server is always tried first. Only a transport-level failure
//! (no HTTP response at all) hands the operation to the simulated backend;
//! an explicit rejection (duplicate username, unknown user, wrong password)
//! propagates to the caller untouched. Successful sessions are persisted in
//! the local cache and reloaded on the next start.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{info, warn};

use tally_core::{Credential, Session, UserProfile};

use crate::cache::{CacheStore, KEY_CREDENTIAL, KEY_PROFILE};
use crate::config::ClientConfig;
use crate::error::{AuthError, CacheError};
use crate::remote::{RemoteApi, RemoteError};
use crate::simulated::SimulatedBackend;

/// Contract shared by the real and simulated auth backends.
#[async_trait]
pub trait AuthBackend {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError>;

    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError>;
}

#[async_trait]
impl AuthBackend for SimulatedBackend {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        SimulatedBackend::register(self, username, email, password).await
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        SimulatedBackend::login(self, username, password).await
    }
}

#[async_trait]
impl AuthBackend for RemoteApi {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        RemoteApi::register(self, username, email, password)
            .await
            .map_err(map_register_error)
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        RemoteApi::login(self, username, password)
            .await
            .map_err(map_login_error)
    }
}

// The gateway validates required fields before calling out, so a register
// 400 from the server means the username is taken.
fn map_register_error(err: RemoteError) -> AuthError {
    match err {
        RemoteError::Transport(reason) => AuthError::Transport(reason),
        RemoteError::Rejected { status, .. } if status == StatusCode::BAD_REQUEST => {
            AuthError::UsernameTaken
        }
        RemoteError::Rejected { message, .. } => AuthError::Rejected(message),
        RemoteError::Decode(message) => AuthError::Rejected(message),
    }
}

fn map_login_error(err: RemoteError) -> AuthError {
    match err {
        RemoteError::Transport(reason) => AuthError::Transport(reason),
        RemoteError::Rejected { status, .. } if status == StatusCode::BAD_REQUEST => {
            AuthError::UserNotFound
        }
        RemoteError::Rejected { status, .. } if status == StatusCode::FORBIDDEN => {
            AuthError::InvalidPassword
        }
        RemoteError::Rejected { message, .. } => AuthError::Rejected(message),
        RemoteError::Decode(message) => AuthError::Rejected(message),
    }
}

/// Front door for authentication: real backend first, simulated stand-in
/// only when the server never answered, session persisted either way.
#[derive(Debug, Clone)]
pub struct AuthGateway {
    cache: CacheStore,
    remote: RemoteApi,
    simulated: SimulatedBackend,
}

impl AuthGateway {
    pub fn new(cache: CacheStore, config: &ClientConfig) -> Self {
        Self {
            remote: RemoteApi::new(config.server_url.clone()),
            simulated: SimulatedBackend::new(cache.clone(), config),
            cache,
        }
    }

    /// Create an account. Falls back to the simulated backend only when the
    /// server is unreachable; a taken username propagates as-is.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Rejected(
                "username and password are required".to_string(),
            ));
        }

        let session = match AuthBackend::register(&self.remote, username, email, password).await {
            Ok(session) => session,
            Err(AuthError::Transport(reason)) => {
                warn!(%reason, "server unreachable, registering against simulated backend");
                self.simulated.register(username, email, password).await?
            }
            // explicit rejections mean "try again", never "switch backends"
            Err(other) => return Err(other),
        };

        self.store_session(&session)?;
        info!(
            username = %session.user.username,
            simulated = session.credential.is_simulated(),
            "session started"
        );
        Ok(session)
    }

    /// Sign in. Same fallback rule as [`AuthGateway::register`].
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::Rejected(
                "username and password are required".to_string(),
            ));
        }

        let session = match AuthBackend::login(&self.remote, username, password).await {
            Ok(session) => session,
            Err(AuthError::Transport(reason)) => {
                warn!(%reason, "server unreachable, trying simulated login");
                self.simulated.login(username, password).await?
            }
            Err(other) => return Err(other),
        };

        self.store_session(&session)?;
        info!(
            username = %session.user.username,
            simulated = session.credential.is_simulated(),
            "session started"
        );
        Ok(session)
    }

    /// Drop the locally cached session. Purely local; no token revocation.
    pub fn logout(&self) -> Result<(), CacheError> {
        self.cache.remove(KEY_CREDENTIAL)?;
        self.cache.remove(KEY_PROFILE)?;
        info!("session cleared");
        Ok(())
    }

    /// The session persisted by the last register/login, if any.
    pub fn stored_session(&self) -> Option<Session> {
        let user: UserProfile = self.cache.get(KEY_PROFILE)?;
        let credential: Credential = self.cache.get(KEY_CREDENTIAL)?;
        Some(Session { user, credential })
    }

    fn store_session(&self, session: &Session) -> Result<(), CacheError> {
        self.cache.set(KEY_PROFILE, &session.user)?;
        self.cache.set(KEY_CREDENTIAL, &session.credential)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Nothing listens on port 9 of localhost, so every request dies at the
    // transport level.
    const DEAD_SERVER: &str = "http://127.0.0.1:9";

    fn gateway(dir: &TempDir) -> AuthGateway {
        let cache = CacheStore::open(dir.path()).unwrap();
        AuthGateway::new(cache, &ClientConfig::for_server(DEAD_SERVER))
    }

    #[tokio::test]
    async fn unreachable_server_falls_back_to_simulated() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);

        let session = gateway
            .register("bob", "bob@example.com", "secret")
            .await
            .unwrap();
        assert!(session.credential.is_simulated());

        let persisted = gateway.stored_session().unwrap();
        assert_eq!(persisted, session);
    }

    #[tokio::test]
    async fn simulated_rejections_still_propagate() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        gateway
            .register("bob", "bob@example.com", "secret")
            .await
            .unwrap();

        let err = gateway.login("bob", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
    }

    #[tokio::test]
    async fn logout_clears_the_stored_session() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        gateway
            .register("bob", "bob@example.com", "secret")
            .await
            .unwrap();

        gateway.logout().unwrap();
        assert!(gateway.stored_session().is_none());
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_before_any_backend() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);

        let err = gateway.register("  ", "x@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
        let err = gateway.login("bob", "").await.unwrap_err();
        assert!(matches!(err, AuthError::Rejected(_)));
    }

    #[tokio::test]
    async fn stored_session_needs_both_keys() {
        let dir = TempDir::new().unwrap();
        let gateway = gateway(&dir);
        gateway
            .cache
            .set(
                KEY_PROFILE,
                &UserProfile {
                    id: 1,
                    username: "bob".into(),
                    email: String::new(),
                },
            )
            .unwrap();
        assert!(gateway.stored_session().is_none());
    }
}
