//! Previous-year question paper routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::auth::AdminUser;
use crate::state::AppState;

#[derive(Serialize)]
pub struct Paper {
    pub id: i64,
    pub year: i32,
    pub title: String,
    pub paper: String,
    pub status: String,
    pub question_paper_url: String,
    pub answer_key_url: String,
}

fn row_to_paper(r: &sqlx::postgres::PgRow) -> Paper {
    Paper {
        id: r.get("id"),
        year: r.get("year"),
        title: r.get("title"),
        paper: r.get("paper"),
        status: r.get("status"),
        question_paper_url: r.get("question_paper_url"),
        answer_key_url: r.get("answer_key_url"),
    }
}

const PAPER_COLUMNS: &str = "id, year, title, paper, status, question_paper_url, answer_key_url";

/// `GET /api/papers` — public list, newest exam year first, GS1..GS4 order
/// within a year.
pub async fn list_papers(State(state): State<AppState>) -> Result<Json<Vec<Paper>>, StatusCode> {
    let rows = sqlx::query(&format!(
        "SELECT {PAPER_COLUMNS} FROM pyq_data ORDER BY year DESC, paper ASC"
    ))
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_paper).collect()))
}

#[derive(Deserialize)]
pub struct PaperBody {
    pub year: i32,
    pub title: String,
    pub paper: String,
    pub status: Option<String>,
    pub question_paper_url: String,
    pub answer_key_url: String,
}

/// `POST /api/papers` — admin create. URLs point at external object storage.
pub async fn create_paper(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<PaperBody>,
) -> Result<(StatusCode, Json<Paper>), StatusCode> {
    if body.title.trim().is_empty() || body.paper.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(&format!(
        r"INSERT INTO pyq_data (year, title, paper, status, question_paper_url, answer_key_url)
          VALUES ($1, $2, $3, COALESCE($4, 'available'), $5, $6)
          RETURNING {PAPER_COLUMNS}",
    ))
    .bind(body.year)
    .bind(body.title.trim())
    .bind(body.paper.trim())
    .bind(&body.status)
    .bind(&body.question_paper_url)
    .bind(&body.answer_key_url)
    .fetch_one(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(row_to_paper(&row))))
}

/// `PUT /api/papers/:id` — admin update (full replace).
pub async fn update_paper(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<PaperBody>,
) -> Result<Json<Paper>, StatusCode> {
    if body.title.trim().is_empty() || body.paper.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(&format!(
        r"UPDATE pyq_data SET
              year = $2, title = $3, paper = $4, status = COALESCE($5, status),
              question_paper_url = $6, answer_key_url = $7, updated_at = now()
          WHERE id = $1
          RETURNING {PAPER_COLUMNS}",
    ))
    .bind(id)
    .bind(body.year)
    .bind(body.title.trim())
    .bind(body.paper.trim())
    .bind(&body.status)
    .bind(&body.question_paper_url)
    .bind(&body.answer_key_url)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_paper(&row)))
}

/// `DELETE /api/papers/:id` — admin delete.
pub async fn delete_paper(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM pyq_data WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
