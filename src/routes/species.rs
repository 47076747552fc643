//! Species-in-news routes — public list, admin CRUD, per-user bookmarks.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;

use super::auth::{AdminUser, AuthUser};
use crate::state::AppState;

#[derive(Serialize)]
pub struct Species {
    pub id: i64,
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub iucn_status: Option<String>,
    pub habitat: Option<String>,
    pub news_context: Option<String>,
    pub source_url: Option<String>,
}

fn row_to_species(r: &sqlx::postgres::PgRow) -> Species {
    Species {
        id: r.get("id"),
        common_name: r.get("common_name"),
        scientific_name: r.get("scientific_name"),
        iucn_status: r.get("iucn_status"),
        habitat: r.get("habitat"),
        news_context: r.get("news_context"),
        source_url: r.get("source_url"),
    }
}

const SPECIES_COLUMNS: &str =
    "id, common_name, scientific_name, iucn_status, habitat, news_context, source_url";

/// `GET /api/species` — public list, newest first.
pub async fn list_species(State(state): State<AppState>) -> Result<Json<Vec<Species>>, StatusCode> {
    let rows = sqlx::query(&format!(
        "SELECT {SPECIES_COLUMNS} FROM species_in_news ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_species).collect()))
}

#[derive(Deserialize)]
pub struct SpeciesBody {
    pub common_name: String,
    pub scientific_name: Option<String>,
    pub iucn_status: Option<String>,
    pub habitat: Option<String>,
    pub news_context: Option<String>,
    pub source_url: Option<String>,
}

/// `POST /api/species` — admin create.
pub async fn create_species(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<SpeciesBody>,
) -> Result<(StatusCode, Json<Species>), StatusCode> {
    if body.common_name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(&format!(
        r"INSERT INTO species_in_news (common_name, scientific_name, iucn_status, habitat, news_context, source_url)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {SPECIES_COLUMNS}",
    ))
    .bind(body.common_name.trim())
    .bind(&body.scientific_name)
    .bind(&body.iucn_status)
    .bind(&body.habitat)
    .bind(&body.news_context)
    .bind(&body.source_url)
    .fetch_one(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok((StatusCode::CREATED, Json(row_to_species(&row))))
}

/// `PUT /api/species/:id` — admin update (full replace).
pub async fn update_species(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<SpeciesBody>,
) -> Result<Json<Species>, StatusCode> {
    if body.common_name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let row = sqlx::query(&format!(
        r"UPDATE species_in_news SET
              common_name = $2, scientific_name = $3, iucn_status = $4,
              habitat = $5, news_context = $6, source_url = $7, updated_at = now()
          WHERE id = $1
          RETURNING {SPECIES_COLUMNS}",
    ))
    .bind(id)
    .bind(body.common_name.trim())
    .bind(&body.scientific_name)
    .bind(&body.iucn_status)
    .bind(&body.habitat)
    .bind(&body.news_context)
    .bind(&body.source_url)
    .fetch_optional(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(row_to_species(&row)))
}

/// `DELETE /api/species/:id` — admin delete. Bookmarks pointing at the row
/// are cleaned up in the same statement (no FK between the two tables
/// because bookmarks are polymorphic over item_type).
pub async fn delete_species(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query("DELETE FROM species_in_news WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    sqlx::query("DELETE FROM bookmarks WHERE item_type = 'species' AND item_id = $1")
        .bind(id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// BOOKMARKS
// =============================================================================

/// `POST /api/species/:id/bookmark` — toggle the caller's bookmark.
/// Returns the resulting state so clients render without a refetch.
pub async fn toggle_bookmark(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(species_id): Path<i64>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM species_in_news WHERE id = $1")
        .bind(species_id)
        .fetch_one(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if exists == 0 {
        return Err(StatusCode::NOT_FOUND);
    }

    let removed = sqlx::query(
        "DELETE FROM bookmarks WHERE user_id = $1 AND item_type = 'species' AND item_id = $2",
    )
    .bind(auth.user.id)
    .bind(species_id)
    .execute(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if removed.rows_affected() > 0 {
        return Ok(Json(serde_json::json!({ "bookmarked": false })));
    }

    sqlx::query("INSERT INTO bookmarks (user_id, item_type, item_id) VALUES ($1, 'species', $2)")
        .bind(auth.user.id)
        .bind(species_id)
        .execute(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(serde_json::json!({ "bookmarked": true })))
}

/// `GET /api/bookmarks/species` — the caller's bookmarked species.
pub async fn list_bookmarked_species(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Species>>, StatusCode> {
    let rows = sqlx::query(
        r"SELECT s.id, s.common_name, s.scientific_name, s.iucn_status,
                 s.habitat, s.news_context, s.source_url
          FROM species_in_news s
          JOIN bookmarks b ON b.item_type = 'species' AND b.item_id = s.id
          WHERE b.user_id = $1
          ORDER BY b.created_at DESC",
    )
    .bind(auth.user.id)
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(rows.iter().map(row_to_species).collect()))
}
