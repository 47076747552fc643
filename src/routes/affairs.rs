//! Current-affairs routes — public reading list, admin-managed content.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::auth::AdminUser;
use super::valid_iso_date;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CurrentAffair {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub category: String,
    pub date: String,
    pub source: String,
    pub source_url: Option<String>,
    pub importance: String,
    pub tags: Vec<String>,
}

fn row_to_affair(r: &sqlx::postgres::PgRow) -> CurrentAffair {
    CurrentAffair {
        id: r.get("id"),
        title: r.get("title"),
        summary: r.get("summary"),
        category: r.get("category"),
        date: r.get("date"),
        source: r.get("source"),
        source_url: r.get("source_url"),
        importance: r.get("importance"),
        tags: r.get("tags"),
    }
}

const AFFAIR_COLUMNS: &str = r"id, title, summary, category, to_char(date, 'YYYY-MM-DD') AS date,
       source, source_url, importance, tags";

fn valid_importance(value: &str) -> bool {
    matches!(value, "High" | "Medium" | "Low")
}

#[derive(Deserialize)]
pub struct ListAffairsQuery {
    pub category: Option<String>,
    pub importance: Option<String>,
}

/// `GET /api/current-affairs` — newest first, optional category/importance
/// filters. Public: reading the feed never requires a login.
pub async fn list_affairs(
    State(state): State<AppState>,
    Query(params): Query<ListAffairsQuery>,
) -> Result<Json<Vec<CurrentAffair>>, StatusCode> {
    let rows = sqlx::query(&format!(
        r"SELECT {AFFAIR_COLUMNS} FROM current_affairs
          WHERE ($1::text IS NULL OR category = $1)
            AND ($2::text IS NULL OR importance = $2)
          ORDER BY date DESC, id DESC",
    ))
    .bind(params.category)
    .bind(params.importance)
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_affair).collect()))
}

#[derive(Deserialize)]
pub struct AffairBody {
    pub title: String,
    pub summary: String,
    pub category: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub source: String,
    pub source_url: Option<String>,
    pub importance: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn validate_affair(body: &AffairBody) -> Result<(), StatusCode> {
    if body.title.trim().is_empty()
        || body.summary.trim().is_empty()
        || !valid_importance(&body.importance)
        || !valid_iso_date(&body.date)
    {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(())
}

/// `POST /api/current-affairs` — admin create.
pub async fn create_affair(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<AffairBody>,
) -> Result<(StatusCode, Json<CurrentAffair>), StatusCode> {
    validate_affair(&body)?;

    let row = sqlx::query(&format!(
        r"INSERT INTO current_affairs (title, summary, category, date, source, source_url, importance, tags)
          VALUES ($1, $2, $3, $4::date, $5, $6, $7, $8)
          RETURNING {AFFAIR_COLUMNS}",
    ))
    .bind(body.title.trim())
    .bind(body.summary.trim())
    .bind(&body.category)
    .bind(&body.date)
    .bind(&body.source)
    .bind(&body.source_url)
    .bind(&body.importance)
    .bind(&body.tags)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "affairs: insert failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((StatusCode::CREATED, Json(row_to_affair(&row))))
}

/// `PUT /api/current-affairs/:id` — admin update (full replace).
pub async fn update_affair(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<AffairBody>,
) -> Result<Json<CurrentAffair>, StatusCode> {
    validate_affair(&body)?;

    let row = sqlx::query(&format!(
        r"UPDATE current_affairs SET
              title = $2, summary = $3, category = $4, date = $5::date,
              source = $6, source_url = $7, importance = $8, tags = $9, updated_at = now()
          WHERE id = $1
          RETURNING {AFFAIR_COLUMNS}",
    ))
    .bind(id)
    .bind(body.title.trim())
    .bind(body.summary.trim())
    .bind(&body.category)
    .bind(&body.date)
    .bind(&body.source)
    .bind(&body.source_url)
    .bind(&body.importance)
    .bind(&body.tags)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_affair(&row)))
}

/// `DELETE /api/current-affairs/:id` — admin delete.
pub async fn delete_affair(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM current_affairs WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "affairs_test.rs"]
mod tests;
