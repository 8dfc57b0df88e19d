//! POST /api/v1/session — login.
//!
//! The single endpoint the session guard bypasses. Deliberately thin: verify
//! credentials, mint a session, hand back the cookie.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use matchgroup_core::ports::{SessionStore, UserStore};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::middleware::session::SESSION_COOKIE;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub mail: String,
    pub password: String,
}

pub async fn login(
    Extension(users): Extension<Arc<dyn UserStore>>,
    Extension(sessions): Extension<Arc<dyn SessionStore>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let digest = hex::encode(Sha256::digest(req.password.as_bytes()));
    let Some(user_id) = users.get_user_id_by_credentials(&req.mail, &digest).await? else {
        tracing::warn!(mail = %req.mail, "login rejected");
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Unauthorized" })),
        )
            .into_response());
    };

    let session = sessions.create_session(&user_id).await?;
    tracing::info!(user_id = %user_id, "session created");
    let cookie = format!(
        "{SESSION_COOKIE}={}; HttpOnly; Path=/; SameSite=Lax",
        session.session_id
    );
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "userId": user_id })),
    )
        .into_response())
}
