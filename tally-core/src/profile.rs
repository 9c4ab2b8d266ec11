//! Account identity and session credentials.

use serde::{Deserialize, Serialize};

/// Token prefix marking credentials issued by the simulated backend.
pub const SIMULATED_TOKEN_PREFIX: &str = "simulated-";

/// Owner of a remote counter collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Bearer credential scoping every remote operation.
///
/// Which backend issued it is decided exactly once, here, and carried as the
/// variant; call sites dispatch by matching on it, never by inspecting the
/// token text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Credential {
    /// Signed token issued by the real server.
    Real { token: String },
    /// Locally synthesized token correlated to a simulated registry entry.
    Simulated { token: String, user_id: i64 },
}

impl Credential {
    /// Wrap a server-issued token.
    pub fn real(token: impl Into<String>) -> Self {
        Credential::Real {
            token: token.into(),
        }
    }

    /// Synthesize a credential for a simulated registry user. The token keeps
    /// its recognizable prefix so persisted sessions stay self-describing.
    pub fn simulated(user_id: i64) -> Self {
        Credential::Simulated {
            token: format!("{SIMULATED_TOKEN_PREFIX}{user_id}"),
            user_id,
        }
    }

    /// The bearer token text.
    pub fn token(&self) -> &str {
        match self {
            Credential::Real { token } | Credential::Simulated { token, .. } => token,
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, Credential::Simulated { .. })
    }
}

/// A signed-in identity: who the user is plus the credential proving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub credential: Credential,
}
