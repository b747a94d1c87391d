// POST /auth/login - authenticate against a family and receive a session token

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{authenticate_family, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Family slug.
    pub family: String,
    /// Caretaker login id; absent for security-PIN (bootstrap) logins.
    pub login_id: Option<String>,
    pub secret: String,
}

/// Authenticate a caretaker (or the family security PIN on a fresh family)
/// and mint a session token.
///
/// The attempt limiter runs before any credential is touched: a locked-out
/// address is rejected even with correct credentials. One success clears
/// the address's counter.
pub async fn login_post(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let source = addr.ip();

    let status = state.login_limiter.check(source);
    if status.locked {
        let retry_after_ms = status.remaining.map(|d| d.as_millis() as u64).unwrap_or(0);
        return Err(AuthError::RateLimited { retry_after_ms }.into());
    }

    let family = state
        .store
        .find_family_by_slug(&payload.family)
        .await?
        .ok_or_else(|| {
            ApiError::from(AuthError::TenantNotFound(payload.family.clone()))
        })?;

    let authenticated = match authenticate_family(
        state.store.as_ref(),
        &family,
        payload.login_id.as_deref(),
        &payload.secret,
    )
    .await
    {
        Ok(authenticated) => authenticated,
        Err(err) => {
            if matches!(err, AuthError::Unauthenticated | AuthError::Forbidden) {
                state.login_limiter.record_failure(source);
            }
            return Err(err.into());
        }
    };

    state.login_limiter.reset(source);

    let caretaker = &authenticated.caretaker;
    let token = state.codec.issue(
        Some(caretaker.id),
        authenticated.role,
        Some(family.id),
        Some(family.slug.clone()),
        false,
        state.session_ttl,
    )?;

    tracing::info!("Login for family '{}', caretaker '{}'", family.slug, caretaker.login_id);

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "caretaker": {
                "id": caretaker.id,
                "login_id": caretaker.login_id,
                "display_name": caretaker.display_name,
                "role": authenticated.role,
                "family": family.slug,
            },
            "expires_in": state.session_ttl.num_seconds()
        }
    })))
}
