use crate::{
    AppState,
    dtos::{LoginDto, LoginResponseDto, Response, SessionStatusDto},
    error::{ErrorMessage, HttpError},
    middleware::{AdminSession, SESSION_COOKIE},
    utils::{fingerprint::client_fingerprint, password},
};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::IntoResponse,
    routing::{get, post},
};
use axum_client_ip::ClientIp;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use tracing::instrument;

/// Failed attempts from one IP before both identity components get blocked.
const MAX_LOGIN_ATTEMPTS: i64 = 3;

/// Router for authentication endpoints
pub fn auth_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(login).layer(app_state.ip_extraction.into_extension()),
        )
        .route("/logout", post(logout))
        .route("/session", get(session_status))
}

/// Admin login with per-identity blocking.
///
/// The client identity is the pair (IP, fingerprint of User-Agent +
/// Accept-Language). A blocked identity gets a bare 403 before credentials
/// are even looked at; every other failure shares one generic 401 message so
/// the response never reveals which check failed.
#[instrument(skip(app_state, headers, body))]
pub async fn login(
    ClientIp(ip): ClientIp,
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginDto>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let user_agent = header_str(&headers, header::USER_AGENT);
    let accept_language = header_str(&headers, header::ACCEPT_LANGUAGE);
    let fingerprint = client_fingerprint(user_agent, accept_language);
    let ip = ip.to_string();

    let blocked = app_state
        .redis_client
        .is_blocked(&ip, &fingerprint)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, checking blocklist: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    if blocked {
        tracing::warn!(ip = %ip, "Login attempt from blocked client");
        return Err(HttpError::forbidden(ErrorMessage::AccessDenied.to_string()));
    }

    // Malformed JSON and empty fields get the same generic rejection as bad
    // credentials; they don't feed the attempt counter.
    let body = match body {
        Ok(Json(body)) => body,
        Err(e) => {
            tracing::warn!(ip = %ip, "Malformed login payload: {}", e);
            return Err(HttpError::unauthorized(
                ErrorMessage::MissingCredentials.to_string(),
            ));
        }
    };
    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        return Err(HttpError::unauthorized(
            ErrorMessage::MissingCredentials.to_string(),
        ));
    }

    let credentials_match = verify_credentials(&app_state, username, &body.password)?;

    if !credentials_match {
        let attempts = app_state
            .redis_client
            .incr_login_attempts(&ip)
            .await
            .map_err(|e| {
                tracing::error!("RedisDB error, incrementing login attempts: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?;

        if attempts >= MAX_LOGIN_ATTEMPTS {
            if let Err(e) = app_state.redis_client.block_client(&ip, &fingerprint).await {
                tracing::error!("RedisDB error, writing blocklist entry: {}", e);
            }
            tracing::warn!(ip = %ip, attempts = attempts, "Client blocked after repeated login failures");
            return Err(HttpError::forbidden(ErrorMessage::AccessDenied.to_string()));
        }

        tracing::warn!(ip = %ip, attempts = attempts, "Login failed");
        return Err(HttpError::unauthorized(
            ErrorMessage::InvalidCredentials.to_string(),
        ));
    }

    if let Err(e) = app_state.redis_client.clear_login_attempts(&ip).await {
        tracing::warn!("Failed to clear login attempts: {:?}", e);
    }

    // A fresh session id on every login defeats fixation: a cookie planted
    // before authentication never names a logged-in session.
    let session_id = uuid::Uuid::new_v4().to_string();
    let session = AdminSession {
        admin_logged_in: true,
        admin_username: username.to_string(),
        last_activity: Utc::now().timestamp(),
    };

    app_state
        .redis_client
        .save_session(&session_id, &session, app_state.env.session_maxage)
        .await
        .map_err(|e| {
            tracing::error!("RedisDB error, saving session: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?;

    let session_cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(app_state.env.session_maxage))
        .build();

    let response = Json(LoginResponseDto {
        success: true,
        message: "Login successful".to_string(),
        redirect: "/admin".to_string(),
    });

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        session_cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!(ip = %ip, "Login successful");
    Ok(response)
}

/// Destroy the server-side session and expire the cookie.
#[instrument(skip(app_state, cookie_jar))]
pub async fn logout(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(cookie) = cookie_jar.get(SESSION_COOKIE) {
        if let Err(e) = app_state.redis_client.delete_session(cookie.value()).await {
            tracing::error!("RedisDB error, deleting session: {}", e);
            return Err(HttpError::server_error(ErrorMessage::ServerError.to_string()));
        }
    }

    let removal_cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .build();

    let response = Json(Response {
        success: true,
        message: "Logged out".to_string(),
    });

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        removal_cookie.to_string().parse().unwrap(),
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);
    tracing::info!("Logout successful");
    Ok(response)
}

/// Session probe for the admin SPA; never errors, just reports state.
#[instrument(skip(app_state, cookie_jar))]
pub async fn session_status(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let session = match cookie_jar.get(SESSION_COOKIE) {
        Some(cookie) => app_state
            .redis_client
            .get_session(cookie.value())
            .await
            .map_err(|e| {
                tracing::error!("RedisDB error, getting session: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            })?,
        None => None,
    };

    let status = match session {
        Some(session) if session.admin_logged_in => SessionStatusDto {
            logged_in: true,
            username: Some(session.admin_username),
        },
        _ => SessionStatusDto {
            logged_in: false,
            username: None,
        },
    };

    Ok(Json(status))
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Compare submitted credentials against the configured admin account. The
/// password side goes through Argon2 verification, never a string compare.
fn verify_credentials(
    app_state: &AppState,
    username: &str,
    password: &str,
) -> Result<bool, HttpError> {
    if username != app_state.env.admin_username {
        return Ok(false);
    }

    password::compare(password, &app_state.env.admin_password_hash).map_err(|e| {
        tracing::error!("Password verification error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })
}
