use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};

use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ErrorMessage, HttpError},
};

/// Name of the session cookie set on login.
pub const SESSION_COOKIE: &str = "admin_session";

/// Server-side session state, stored in Redis keyed by the cookie value.
///
/// Inserted into request extensions by [`admin_auth`] so handlers can name
/// the acting admin without touching Redis again.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdminSession {
    pub admin_logged_in: bool,
    pub admin_username: String,
    pub last_activity: i64,
}

/// Session middleware guarding every admin-mutating route.
///
/// Reads the session cookie, loads the session from Redis, rejects with 401
/// when it is missing, expired, or not an admin login, then refreshes
/// `last_activity` and the Redis TTL (sliding idle timeout) and passes the
/// session to the handler via request extensions.
pub async fn admin_auth(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let session_id = cookie_jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::NotAuthenticated.to_string()))?;

    let session = app_state
        .redis_client
        .get_session(&session_id)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, getting session: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let mut session = session
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::SessionExpired.to_string()))?;

    if !session.admin_logged_in {
        return Err(HttpError::unauthorized(
            ErrorMessage::NotAuthenticated.to_string(),
        ));
    }

    // The Redis TTL already expires idle sessions; this check additionally
    // covers a session whose TTL was refreshed by a crashed request.
    let now = Utc::now().timestamp();
    if now - session.last_activity > app_state.env.session_maxage {
        if let Err(e) = app_state.redis_client.delete_session(&session_id).await {
            tracing::warn!("Failed to delete idle session: {}", e);
        }
        return Err(HttpError::unauthorized(
            ErrorMessage::SessionExpired.to_string(),
        ));
    }

    session.last_activity = now;
    if let Err(e) = app_state
        .redis_client
        .save_session(&session_id, &session, app_state.env.session_maxage)
        .await
    {
        // The request still carries a valid session; don't fail it over a
        // missed TTL refresh.
        tracing::warn!("Failed to refresh session TTL: {}", e);
    }

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
