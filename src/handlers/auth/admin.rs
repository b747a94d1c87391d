// POST /auth/admin - global administrator login

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{verify_secret, AuthError, SecretPolicy};
use crate::database::models::Role;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub passphrase: String,
}

/// Authenticate the global administrator passphrase and mint a token with
/// no fixed family: the family context is re-derived on every request.
pub async fn admin_login_post(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<AdminLoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let source = addr.ip();

    let status = state.login_limiter.check(source);
    if status.locked {
        let retry_after_ms = status.remaining.map(|d| d.as_millis() as u64).unwrap_or(0);
        return Err(AuthError::RateLimited { retry_after_ms }.into());
    }

    // No configured passphrase means no global admin access at all
    let Some(stored_hash) = state.admin_passphrase_hash.as_deref() else {
        state.login_limiter.record_failure(source);
        return Err(AuthError::Unauthenticated.into());
    };

    if !verify_secret(&payload.passphrase, stored_hash, SecretPolicy::Hashed)? {
        state.login_limiter.record_failure(source);
        return Err(AuthError::Unauthenticated.into());
    }

    state.login_limiter.reset(source);

    let token = state.codec.issue(None, Role::Admin, None, None, true, state.session_ttl)?;

    tracing::info!("Global administrator login from {}", source);

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "is_global_admin": true,
            "expires_in": state.session_ttl.num_seconds()
        }
    })))
}
