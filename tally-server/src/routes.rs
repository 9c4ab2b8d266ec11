//! HTTP routes for authentication and counter sync.
//!
//! - POST /auth/register  - Create an account and get a JWT
//! - POST /auth/login     - Authenticate and get a JWT
//! - GET  /counters       - Full collection for the caller (authenticated)
//! - POST /counters/sync  - Replace the caller's collection (authenticated)
//! - GET  /health         - Liveness probe

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use tally_core::{Counter, UserProfile};

use crate::auth::{Claims, TokenSigner};
use crate::db::Db;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Db>,
    pub tokens: TokenSigner,
}

/// Create the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/counters", get(get_counters))
        .route("/counters/sync", post(sync_counters))
        .with_state(state)
}

// =============================================================================
// Request/Response Types
// =============================================================================

// Fields default to empty so an absent field reaches the handler's own
// validation (400) instead of a deserialize rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub count: usize,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn internal(err: impl std::fmt::Display, message: &str) -> Response {
    warn!(error = %err, "{}", message);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}

// =============================================================================
// Auth extraction
// =============================================================================

/// The authenticated caller, pulled out of the `Authorization` header.
/// A missing or non-Bearer header is a 401; a bad or expired token a 403.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = bearer else {
            return Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Access token required",
            ));
        };

        match state.tokens.verify(token) {
            Ok(claims) => Ok(AuthUser(claims)),
            Err(_) => Err(error_response(
                StatusCode::FORBIDDEN,
                "Invalid or expired token",
            )),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /auth/register
async fn register(State(state): State<AppState>, Json(req): Json<RegisterRequest>) -> Response {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        );
    }

    match state.db.find_user(&req.username) {
        Ok(Some(_)) => {
            return error_response(StatusCode::BAD_REQUEST, "Username already taken");
        }
        Ok(None) => {}
        Err(err) => return internal(err, "Registration failed"),
    }

    let password_hash = match crate::auth::hash_password(&req.password) {
        Ok(hash) => hash,
        Err(err) => return internal(err, "Registration failed"),
    };

    let user = match state.db.create_user(&req.username, &req.email, &password_hash) {
        Ok(user) => user,
        Err(err) => return internal(err, "Registration failed"),
    };

    match state.tokens.issue(user.id, &user.username) {
        Ok(token) => {
            info!(username = %user.username, id = user.id, "user registered");
            Json(AuthResponse {
                token,
                user: UserProfile {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                },
            })
            .into_response()
        }
        Err(err) => internal(err, "Registration failed"),
    }
}

/// POST /auth/login
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Response {
    let user = match state.db.find_user(&req.username) {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::BAD_REQUEST, "User not found"),
        Err(err) => return internal(err, "Login failed"),
    };

    match crate::auth::verify_password(&req.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => return error_response(StatusCode::FORBIDDEN, "Invalid password"),
        Err(err) => return internal(err, "Login failed"),
    }

    match state.tokens.issue(user.id, &user.username) {
        Ok(token) => {
            info!(username = %user.username, "user logged in");
            Json(AuthResponse {
                token,
                user: UserProfile {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                },
            })
            .into_response()
        }
        Err(err) => internal(err, "Login failed"),
    }
}

/// GET /counters
async fn get_counters(State(state): State<AppState>, AuthUser(claims): AuthUser) -> Response {
    match state.db.list_counters(claims.id) {
        Ok(counters) => Json(counters).into_response(),
        Err(err) => internal(err, "Failed to load counters"),
    }
}

/// POST /counters/sync
async fn sync_counters(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(counters): Json<Vec<Counter>>,
) -> Response {
    match state.db.replace_counters(claims.id, &counters) {
        Ok(count) => {
            info!(user = claims.id, count, "counters synced");
            Json(SyncResponse {
                success: true,
                count,
            })
            .into_response()
        }
        Err(err) => internal(err, "Sync failed"),
    }
}
