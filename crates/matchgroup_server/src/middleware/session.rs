//! Session guard — resolves the SESSION_ID cookie to a user identity.
//!
//! Applied to every route except the login endpoint, which is bypassed by
//! method + path so an unauthenticated login can go through. On success the
//! resolved user id travels downstream both as the `X-DA-USER-ID` header and
//! as a typed `AuthedUser` request extension; handlers read the extension.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use matchgroup_core::ports::SessionStore;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "SESSION_ID";
pub const USER_ID_HEADER: &str = "x-da-user-id";
pub const LOGIN_PATH: &str = "/api/v1/session";

/// The authenticated identity attached to a forwarded request.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub String);

pub async fn session_auth(
    Extension(sessions): Extension<Arc<dyn SessionStore>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Login is the one unauthenticated endpoint.
    if req.method() == Method::POST && req.uri().path() == LOGIN_PATH {
        return Ok(next.run(req).await);
    }

    let Some(session_id) = cookie_value(req.headers(), SESSION_COOKIE) else {
        tracing::warn!("cookies or session id is empty");
        return Ok(unauthorized());
    };

    // An unknown session id is a clean rejection; store failures propagate.
    let Some(session) = sessions.get_session_by_id(&session_id).await? else {
        tracing::warn!("invalid session id is set");
        return Ok(unauthorized());
    };

    tracing::debug!(user_id = %session.user_id, "user has a valid session");
    if let Ok(value) = HeaderValue::from_str(&session.user_id) {
        req.headers_mut().insert(USER_ID_HEADER, value);
    }
    req.extensions_mut().insert(AuthedUser(session.user_id));
    Ok(next.run(req).await)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "message": "Unauthorized" })),
    )
        .into_response()
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let h = headers("theme=dark; SESSION_ID=abc123; lang=en");
        assert_eq!(cookie_value(&h, SESSION_COOKIE).as_deref(), Some("abc123"));
    }

    #[test]
    fn cookie_value_misses_absent_cookie() {
        let h = headers("theme=dark");
        assert!(cookie_value(&h, SESSION_COOKIE).is_none());
        assert!(cookie_value(&HeaderMap::new(), SESSION_COOKIE).is_none());
    }

    #[test]
    fn cookie_value_does_not_match_on_prefix() {
        let h = headers("SESSION_ID_OLD=stale");
        assert!(cookie_value(&h, SESSION_COOKIE).is_none());
    }
}
