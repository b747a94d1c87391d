//! Request authentication middleware and the escalating guards.
//!
//! `auth_context_middleware` is the "any authenticated caller" layer: it
//! assembles a [`RequestAuth`] from the raw request, resolves it, and
//! injects the resulting [`AuthContext`] as an extension. The two guards
//! below compose after it for routes with stronger requirements.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{AuthContext, RequestAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Name of the legacy session identifier cookie.
pub const SESSION_COOKIE: &str = "session_id";

/// Resolve the caller's identity and inject it, rejecting requests with no
/// usable credential.
pub async fn auth_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let request_auth = extract_request_auth(&request);
    let context = state.resolver.resolve(&request_auth).await?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Guard: caller must be a family ADMIN (fallback included) or a global
/// administrator.
pub async fn require_family_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !context.is_family_admin() {
        return Err(ApiError::forbidden("Family administrator access required"));
    }
    Ok(next.run(request).await)
}

/// Guard: caller must be a global administrator.
pub async fn require_global_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let context = request
        .extensions()
        .get::<AuthContext>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !context.is_global_admin {
        return Err(ApiError::forbidden("Global administrator access required"));
    }
    Ok(next.run(request).await)
}

/// Build the framework-independent auth view of a request.
pub fn extract_request_auth(request: &Request) -> RequestAuth {
    RequestAuth {
        bearer: bearer_token(request.headers()),
        legacy_session: session_cookie(request.headers()),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(String::from),
        referer: header_string(request.headers(), "referer"),
    }
}

/// Extract the bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = header_string(headers, "authorization")?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = header_string(headers, "cookie")?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn bearer_token_is_stripped() {
        let map = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(bearer_token(&map).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_authorization_is_ignored() {
        let map = headers(&[("authorization", "Basic dXNlcjpwdw==")]);
        assert_eq!(bearer_token(&map), None);
    }

    #[test]
    fn empty_bearer_is_ignored() {
        let map = headers(&[("authorization", "Bearer ")]);
        assert_eq!(bearer_token(&map), None);
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let map = headers(&[("cookie", "theme=dark; session_id=legacy-123; lang=en")]);
        assert_eq!(session_cookie(&map).as_deref(), Some("legacy-123"));
    }

    #[test]
    fn missing_session_cookie_is_none() {
        let map = headers(&[("cookie", "theme=dark")]);
        assert_eq!(session_cookie(&map), None);
    }
}
