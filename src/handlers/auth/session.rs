// Session management for authenticated callers

use axum::{extract::State, http::HeaderMap, response::Json, Extension};
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::auth::bearer_token;
use crate::state::AppState;

/// DELETE /api/auth/session - explicit logout.
///
/// Revokes the presented bearer token until its natural expiry. Legacy
/// cookie sessions carry no token and have nothing to revoke here.
pub async fn session_logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let revoked = match bearer_token(&headers) {
        Some(token) => state.revocations.revoke(&token),
        None => false,
    };

    Ok(Json(json!({
        "success": true,
        "data": { "revoked": revoked }
    })))
}

/// GET /api/auth/whoami - echo the resolved authorization context.
pub async fn session_whoami(Extension(context): Extension<AuthContext>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "authenticated": true,
            "operator_id": context.operator_id,
            "role": context.role,
            "tenant_id": context.tenant_id,
            "tenant_slug": context.tenant_slug,
            "is_global_admin": context.is_global_admin
        }
    }))
}
