//! Productivity routes — daily targets and accumulated study durations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::auth::AuthUser;
use super::valid_iso_date;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DailyTarget {
    pub id: i64,
    pub date: String,
    pub target: String,
    pub status: String,
    pub productivity_rating: Option<i32>,
    pub study_seconds: Option<i64>,
}

fn row_to_target(r: &sqlx::postgres::PgRow) -> DailyTarget {
    DailyTarget {
        id: r.get("id"),
        date: r.get("date"),
        target: r.get("target"),
        status: r.get("status"),
        productivity_rating: r.get("productivity_rating"),
        study_seconds: r.get("study_seconds"),
    }
}

const TARGET_COLUMNS: &str = r"id, to_char(date, 'YYYY-MM-DD') AS date, target, status,
       productivity_rating, study_seconds";

fn valid_status(value: &str) -> bool {
    matches!(value, "pending" | "achieved" | "failed")
}

fn valid_rating(value: Option<i32>) -> bool {
    value.is_none_or(|r| (1..=5).contains(&r))
}

#[derive(Deserialize)]
pub struct ListTargetsQuery {
    /// `YYYY-MM-DD`; omitted lists all of the caller's targets.
    pub date: Option<String>,
}

/// `GET /api/targets` — the caller's targets, newest first.
pub async fn list_targets(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<ListTargetsQuery>,
) -> Result<Json<Vec<DailyTarget>>, StatusCode> {
    if params.date.as_deref().is_some_and(|d| !valid_iso_date(d)) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let rows = sqlx::query(&format!(
        r"SELECT {TARGET_COLUMNS} FROM daily_targets
          WHERE user_id = $1 AND ($2::date IS NULL OR date = $2::date)
          ORDER BY date DESC, created_at DESC",
    ))
    .bind(auth.user.id)
    .bind(params.date)
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_target).collect()))
}

#[derive(Deserialize)]
pub struct CreateTargetBody {
    /// `YYYY-MM-DD`.
    pub date: String,
    pub target: String,
}

/// `POST /api/targets` — add a target for a day, status starts `pending`.
pub async fn create_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTargetBody>,
) -> Result<(StatusCode, Json<DailyTarget>), StatusCode> {
    if body.target.trim().is_empty() || !valid_iso_date(&body.date) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(&format!(
        r"INSERT INTO daily_targets (user_id, date, target)
          VALUES ($1, $2::date, $3)
          RETURNING {TARGET_COLUMNS}",
    ))
    .bind(auth.user.id)
    .bind(&body.date)
    .bind(body.target.trim())
    .fetch_one(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(row_to_target(&row))))
}

#[derive(Deserialize)]
pub struct UpdateTargetBody {
    pub target: Option<String>,
    pub status: Option<String>,
    pub productivity_rating: Option<i32>,
    pub study_seconds: Option<i64>,
}

/// `PATCH /api/targets/:id` — update text, mark achieved/failed, attach a
/// productivity rating or the day's study time.
pub async fn update_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTargetBody>,
) -> Result<Json<DailyTarget>, StatusCode> {
    if let Some(status) = body.status.as_deref() {
        if !valid_status(status) {
            return Err(StatusCode::BAD_REQUEST);
        }
    }
    if !valid_rating(body.productivity_rating) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let target = match body.target.as_deref().map(str::trim) {
        Some("") => return Err(StatusCode::BAD_REQUEST),
        other => other.map(str::to_owned),
    };

    let row = sqlx::query(&format!(
        r"UPDATE daily_targets SET
              target = COALESCE($3, target),
              status = COALESCE($4, status),
              productivity_rating = COALESCE($5, productivity_rating),
              study_seconds = COALESCE($6, study_seconds),
              updated_at = now()
          WHERE id = $1 AND user_id = $2
          RETURNING {TARGET_COLUMNS}",
    ))
    .bind(id)
    .bind(auth.user.id)
    .bind(target)
    .bind(&body.status)
    .bind(body.productivity_rating)
    .bind(body.study_seconds)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_target(&row)))
}

/// `DELETE /api/targets/:id` — remove one of the caller's targets.
pub async fn delete_target(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM daily_targets WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(auth.user.id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// STUDY DURATIONS
// =============================================================================

#[derive(Serialize)]
pub struct StudyDuration {
    pub date: String,
    pub duration_seconds: i64,
}

#[derive(Deserialize)]
pub struct AddDurationBody {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Seconds to add to the day's running total.
    pub seconds: i64,
}

/// `POST /api/study-durations` — accumulate study time into a day's total.
pub async fn add_study_duration(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<AddDurationBody>,
) -> Result<Json<StudyDuration>, StatusCode> {
    if body.seconds <= 0 || !valid_iso_date(&body.date) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(
        r"INSERT INTO study_durations (user_id, date, duration_seconds)
          VALUES ($1, $2::date, $3)
          ON CONFLICT (user_id, date) DO UPDATE SET
              duration_seconds = study_durations.duration_seconds + EXCLUDED.duration_seconds,
              updated_at = now()
          RETURNING to_char(date, 'YYYY-MM-DD') AS date, duration_seconds",
    )
    .bind(auth.user.id)
    .bind(&body.date)
    .bind(body.seconds)
    .fetch_one(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(StudyDuration {
        date: row.get("date"),
        duration_seconds: row.get("duration_seconds"),
    }))
}

/// `GET /api/study-durations` — the caller's per-day totals, newest first.
pub async fn list_study_durations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<StudyDuration>>, StatusCode> {
    let rows = sqlx::query(
        r"SELECT to_char(date, 'YYYY-MM-DD') AS date, duration_seconds
          FROM study_durations WHERE user_id = $1 ORDER BY date DESC",
    )
    .bind(auth.user.id)
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        rows.iter()
            .map(|r| StudyDuration { date: r.get("date"), duration_seconds: r.get("duration_seconds") })
            .collect(),
    ))
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
