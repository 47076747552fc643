//! Friend graph routes — requests, accept/reject/cancel, friends list.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::state::AppState;

#[derive(Serialize)]
pub struct FriendRequestRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub display_name: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct FriendRow {
    pub user_id: Uuid,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub expert_subject: Option<String>,
    pub since: String,
}

#[derive(Deserialize)]
pub struct SendRequestBody {
    pub receiver_id: Uuid,
    pub message: Option<String>,
}

/// `POST /api/friends/requests` — send a friend request.
pub async fn send_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SendRequestBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), StatusCode> {
    if body.receiver_id == auth.user.id {
        return Err(StatusCode::BAD_REQUEST);
    }

    // A live edge in the opposite direction also blocks: either they are
    // already friends, or the other side asked first.
    let reverse_live: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM friend_requests
         WHERE sender_id = $1 AND receiver_id = $2 AND status IN ('pending', 'accepted')",
    )
    .bind(body.receiver_id)
    .bind(auth.user.id)
    .fetch_one(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    if reverse_live > 0 {
        return Err(StatusCode::CONFLICT);
    }

    let id = Uuid::new_v4();
    let result = match body.message.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => {
            sqlx::query(
                "INSERT INTO friend_requests (id, sender_id, receiver_id, message) VALUES ($1, $2, $3, $4)",
            )
            .bind(id)
            .bind(auth.user.id)
            .bind(body.receiver_id)
            .bind(message)
            .execute(&state.pool)
            .await
        }
        // Omitted message falls back to the column default greeting.
        None => {
            sqlx::query("INSERT INTO friend_requests (id, sender_id, receiver_id) VALUES ($1, $2, $3)")
                .bind(id)
                .bind(auth.user.id)
                .bind(body.receiver_id)
                .execute(&state.pool)
                .await
        }
    };

    match result {
        Ok(_) => Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id })))),
        Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
            Err(StatusCode::CONFLICT)
        }
        Err(e) if e.as_database_error().is_some_and(|db| db.is_foreign_key_violation()) => {
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            tracing::error!(error = %e, "friends: request insert failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// `GET /api/friends/requests/pending` — incoming pending requests.
pub async fn pending_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FriendRequestRow>>, StatusCode> {
    list_requests(&state, auth.user.id, Direction::Incoming).await
}

/// `GET /api/friends/requests/sent` — outgoing pending requests.
pub async fn sent_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FriendRequestRow>>, StatusCode> {
    list_requests(&state, auth.user.id, Direction::Outgoing).await
}

enum Direction {
    Incoming,
    Outgoing,
}

async fn list_requests(
    state: &AppState,
    user_id: Uuid,
    direction: Direction,
) -> Result<Json<Vec<FriendRequestRow>>, StatusCode> {
    // The joined display name is the counterparty's, whichever side we are.
    let sql = match direction {
        Direction::Incoming => {
            r"SELECT fr.id, fr.sender_id, fr.receiver_id, fr.message, u.display_name,
                     to_char(fr.created_at, 'YYYY-MM-DD HH24:MI') AS created_at
              FROM friend_requests fr JOIN users u ON u.id = fr.sender_id
              WHERE fr.receiver_id = $1 AND fr.status = 'pending'
              ORDER BY fr.created_at DESC"
        }
        Direction::Outgoing => {
            r"SELECT fr.id, fr.sender_id, fr.receiver_id, fr.message, u.display_name,
                     to_char(fr.created_at, 'YYYY-MM-DD HH24:MI') AS created_at
              FROM friend_requests fr JOIN users u ON u.id = fr.receiver_id
              WHERE fr.sender_id = $1 AND fr.status = 'pending'
              ORDER BY fr.created_at DESC"
        }
    };

    let rows = sqlx::query(sql)
        .bind(user_id)
        .fetch_all(&state.pool)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        rows.iter()
            .map(|r| FriendRequestRow {
                id: r.get("id"),
                sender_id: r.get("sender_id"),
                receiver_id: r.get("receiver_id"),
                display_name: r.get("display_name"),
                message: r.get("message"),
                created_at: r.get("created_at"),
            })
            .collect(),
    ))
}

/// `POST /api/friends/requests/:id/accept` — receiver accepts.
pub async fn accept_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    resolve_request(&state, request_id, auth.user.id, "accepted").await
}

/// `POST /api/friends/requests/:id/reject` — receiver rejects.
pub async fn reject_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    resolve_request(&state, request_id, auth.user.id, "rejected").await
}

async fn resolve_request(
    state: &AppState,
    request_id: Uuid,
    receiver_id: Uuid,
    status: &str,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let result = sqlx::query(
        "UPDATE friend_requests SET status = $3
         WHERE id = $1 AND receiver_id = $2 AND status = 'pending'",
    )
    .bind(request_id)
    .bind(receiver_id)
    .bind(status)
    .execute(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

/// `DELETE /api/friends/requests/:id` — sender cancels a pending request.
pub async fn cancel_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query(
        "DELETE FROM friend_requests WHERE id = $1 AND sender_id = $2 AND status = 'pending'",
    )
    .bind(request_id)
    .bind(auth.user.id)
    .execute(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/friends` — accepted edges in either direction, with the
/// counterparty's profile card fields.
pub async fn list_friends(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<FriendRow>>, StatusCode> {
    let rows = sqlx::query(
        r"SELECT other.id AS user_id, other.display_name, p.photo_url, p.expert_subject,
                 to_char(fr.created_at, 'YYYY-MM-DD') AS since
          FROM friend_requests fr
          JOIN users other
            ON other.id = CASE WHEN fr.sender_id = $1 THEN fr.receiver_id ELSE fr.sender_id END
          LEFT JOIN public_profiles p ON p.user_id = other.id
          WHERE fr.status = 'accepted' AND (fr.sender_id = $1 OR fr.receiver_id = $1)
          ORDER BY other.display_name",
    )
    .bind(auth.user.id)
    .fetch_all(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(
        rows.iter()
            .map(|r| FriendRow {
                user_id: r.get("user_id"),
                display_name: r.get("display_name"),
                photo_url: r.get("photo_url"),
                expert_subject: r.get("expert_subject"),
                since: r.get("since"),
            })
            .collect(),
    ))
}

/// `DELETE /api/friends/:user_id` — unfriend: drop the accepted edge.
pub async fn unfriend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(other_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    let result = sqlx::query(
        "DELETE FROM friend_requests
         WHERE status = 'accepted'
           AND ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))",
    )
    .bind(auth.user.id)
    .bind(other_id)
    .execute(&state.pool)
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(StatusCode::NO_CONTENT)
}
