//! Auth routes — register/login/logout, session cookie, auth extractors.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use uuid::Uuid;

use crate::services::session;
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

pub(crate) fn cookie_secure() -> bool {
    if let Some(value) = env_bool("COOKIE_SECURE") {
        return value;
    }

    std::env::var("PUBLIC_BASE_URL")
        .map(|uri| uri.starts_with("https://"))
        .unwrap_or(false)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure())
        .max_age(Duration::ZERO)
        .build()
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, token)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user, token: token.to_owned() })
    }
}

/// Authenticated admin. Wraps [`AuthUser`] and rejects non-admins with 403.
/// Gates the content-management endpoints (affairs, species, papers).
pub struct AdminUser {
    pub user: session::SessionUser,
}

impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if !auth.user.is_admin {
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Self { user: auth.user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// `POST /api/auth/register` — create a user, its profile stub, and a session.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(CookieJar, (StatusCode, Json<session::SessionUser>)), StatusCode> {
    let email = body.email.trim().to_ascii_lowercase();
    let display_name = body.display_name.trim();
    if email.is_empty() || !email.contains('@') || display_name.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if body.password.len() < 6 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let user_id = Uuid::new_v4();
    let salt = session::generate_salt();
    let hash = session::hash_password(&body.password, &salt);

    let result = sqlx::query(
        "INSERT INTO users (id, email, display_name, password_hash, password_salt)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(&email)
    .bind(display_name)
    .bind(&hash)
    .bind(&salt)
    .execute(&state.pool)
    .await;

    if let Err(e) = result {
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            return Err(StatusCode::CONFLICT);
        }
        tracing::error!(error = %e, "register: user insert failed");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    // Profile row exists from day one so the directory never 404s on a
    // freshly registered user.
    sqlx::query("INSERT INTO public_profiles (user_id, display_name) VALUES ($1, $2)")
        .bind(user_id)
        .bind(display_name)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let token = session::create_session(&state.pool, user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let user = session::SessionUser {
        id: user_id,
        email,
        display_name: display_name.to_owned(),
        is_admin: false,
    };
    let jar = CookieJar::new().add(session_cookie(token));
    Ok((jar, (StatusCode::CREATED, Json(user))))
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/login` — verify credentials, start a session, set cookie.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<(CookieJar, Json<session::SessionUser>), StatusCode> {
    let email = body.email.trim().to_ascii_lowercase();

    let Some(record) = session::find_login(&state.pool, &email)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if !session::verify_password(&body.password, &record.password_salt, &record.password_hash) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let token = session::create_session(&state.pool, record.user.id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(user_id = %record.user.id, "auth: login");
    let jar = CookieJar::new().add(session_cookie(token));
    Ok((jar, Json(record.user)))
}

/// `GET /api/auth/me` — return the current user.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

/// `POST /api/auth/logout` — delete the session, clear the cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let _ = session::delete_session(&state.pool, &auth.token).await;
    let jar = CookieJar::new().add(clear_session_cookie());
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
