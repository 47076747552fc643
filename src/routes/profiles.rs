//! Public profile routes — aspirant directory and own-profile editing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::state::AppState;

#[derive(Serialize)]
pub struct PublicProfile {
    pub user_id: Uuid,
    pub display_name: String,
    pub about: Option<String>,
    pub expert_subject: Option<String>,
    pub target_year: Option<String>,
    pub preparing_since: Option<String>,
    pub photo_url: Option<String>,
    pub member_since: Option<String>,
}

fn row_to_profile(r: &sqlx::postgres::PgRow) -> PublicProfile {
    PublicProfile {
        user_id: r.get("user_id"),
        display_name: r.get("display_name"),
        about: r.get("about"),
        expert_subject: r.get("expert_subject"),
        target_year: r.get("target_year"),
        preparing_since: r.get("preparing_since"),
        photo_url: r.get("photo_url"),
        member_since: r.get("member_since"),
    }
}

const PROFILE_COLUMNS: &str = r"p.user_id, p.display_name, p.about, p.expert_subject,
       p.target_year, p.preparing_since, p.photo_url,
       to_char(p.created_at, 'YYYY-MM-DD') AS member_since";

/// `GET /api/profiles` — the aspirant directory, newest first.
pub async fn list_profiles(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<PublicProfile>>, StatusCode> {
    let rows = sqlx::query(&format!(
        "SELECT {PROFILE_COLUMNS} FROM public_profiles p ORDER BY p.created_at DESC"
    ))
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_profile).collect()))
}

/// `GET /api/profiles/:user_id` — one aspirant's public profile.
pub async fn get_profile(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<PublicProfile>, StatusCode> {
    let row = sqlx::query(&format!(
        "SELECT {PROFILE_COLUMNS} FROM public_profiles p WHERE p.user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_profile(&row)))
}

#[derive(Deserialize)]
pub struct UpdateProfileBody {
    pub display_name: Option<String>,
    pub about: Option<String>,
    pub expert_subject: Option<String>,
    pub target_year: Option<String>,
    pub preparing_since: Option<String>,
    pub photo_url: Option<String>,
}

/// `PUT /api/profile` — update the caller's own profile. Display-name
/// changes propagate to the users table so future sessions see them.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<PublicProfile>, StatusCode> {
    let display_name = match body.display_name.as_deref().map(str::trim) {
        Some("") => return Err(StatusCode::BAD_REQUEST),
        Some(name) => Some(name.to_owned()),
        None => None,
    };

    if let Some(name) = &display_name {
        sqlx::query("UPDATE users SET display_name = $1 WHERE id = $2")
            .bind(name)
            .bind(auth.user.id)
            .execute(&state.pool)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    }

    let row = sqlx::query(&format!(
        r"UPDATE public_profiles p SET
              display_name = COALESCE($2, p.display_name),
              about = COALESCE($3, p.about),
              expert_subject = COALESCE($4, p.expert_subject),
              target_year = COALESCE($5, p.target_year),
              preparing_since = COALESCE($6, p.preparing_since),
              photo_url = COALESCE($7, p.photo_url),
              updated_at = now()
          WHERE p.user_id = $1
          RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(auth.user.id)
    .bind(display_name)
    .bind(body.about)
    .bind(body.expert_subject)
    .bind(body.target_year)
    .bind(body.preparing_since)
    .bind(body.photo_url)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_profile(&row)))
}
