//! Room service — directory CRUD, password gate, and live join/leave.
//!
//! DESIGN
//! ======
//! Room rows are durable in Postgres; live connection state (who is in the
//! room right now, who is typing) lives in `AppState` and exists only while
//! at least one client is connected. Name uniqueness is case-insensitive,
//! enforced by a unique index on `lower(name)`, so concurrent duplicate
//! creators race to a clean error instead of both succeeding.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::frame::Frame;
use crate::state::{AppState, RoomMember, RoomState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("a room named \"{0}\" already exists")]
    NameTaken(String),
    #[error("room name required")]
    NameRequired,
    #[error("room not found: {0}")]
    NotFound(Uuid),
    #[error("wrong password")]
    WrongPassword,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::frame::ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NameTaken(_) => "E_DUPLICATE_NAME",
            Self::NameRequired => "E_NAME_REQUIRED",
            Self::NotFound(_) => "E_ROOM_NOT_FOUND",
            Self::WrongPassword => "E_PASSWORD",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Row returned from room queries. The stored password never leaves the
/// service layer; callers only see `has_password`.
#[derive(Debug, Clone)]
pub struct RoomRow {
    pub id: Uuid,
    pub name: String,
    pub has_password: bool,
}

// =============================================================================
// DIRECTORY
// =============================================================================

/// Create a new room with an optional plain-string password.
///
/// # Errors
///
/// `NameRequired` for blank names, `NameTaken` on a case-insensitive
/// collision, `Database` otherwise.
pub async fn create_room(
    pool: &PgPool,
    name: &str,
    password: Option<&str>,
    created_by: Option<&str>,
) -> Result<RoomRow, RoomError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RoomError::NameRequired);
    }

    let id = Uuid::new_v4();
    let password = password.map(str::trim).filter(|p| !p.is_empty());
    let result = sqlx::query("INSERT INTO rooms (id, name, password, created_by) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(password)
        .bind(created_by)
        .execute(pool)
        .await;

    match result {
        Ok(_) => {
            info!(%id, name, "room created");
            Ok(RoomRow { id, name: name.to_owned(), has_password: password.is_some() })
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(RoomError::NameTaken(name.to_owned()))
        }
        Err(e) => Err(e.into()),
    }
}

/// List all rooms, newest first.
///
/// # Errors
///
/// Returns a database error if the query fails.
pub async fn list_rooms(pool: &PgPool) -> Result<Vec<RoomRow>, RoomError> {
    let rows = sqlx::query_as::<_, (Uuid, String, bool)>(
        "SELECT id, name, password IS NOT NULL
         FROM rooms
         ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, has_password)| RoomRow { id, name, has_password })
        .collect())
}

/// Verify that a room exists and that the supplied password matches.
/// The gate is plain string equality, as the original system did it.
///
/// # Errors
///
/// `NotFound` for unknown rooms, `WrongPassword` when the stored password
/// does not match the one supplied.
pub async fn verify_join(pool: &PgPool, room_id: Uuid, password: Option<&str>) -> Result<RoomRow, RoomError> {
    let row = sqlx::query_as::<_, (Uuid, String, Option<String>)>(
        "SELECT id, name, password FROM rooms WHERE id = $1",
    )
    .bind(room_id)
    .fetch_optional(pool)
    .await?;

    let Some((id, name, stored)) = row else {
        return Err(RoomError::NotFound(room_id));
    };

    if let Some(stored) = &stored {
        if password != Some(stored.as_str()) {
            return Err(RoomError::WrongPassword);
        }
    }

    Ok(RoomRow { id, name, has_password: stored.is_some() })
}

// =============================================================================
// LIVE JOIN / LEAVE
// =============================================================================

/// Register a connected client as a joined member of a room.
/// Returns the member list snapshot after the join.
pub async fn join_live(
    state: &AppState,
    room_id: Uuid,
    client_id: Uuid,
    tx: tokio::sync::mpsc::Sender<Frame>,
    member: RoomMember,
) -> Vec<RoomMember> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(room_id).or_insert_with(RoomState::new);
    room.clients.insert(client_id, tx);
    room.members.insert(client_id, member);
    info!(%room_id, %client_id, members = room.members.len(), "client joined room");
    room.members.values().cloned().collect()
}

/// Remove a client from a room's live state, clearing its typing entry.
/// Evicts the room state once empty. Returns the removed member, if any.
pub async fn leave_live(state: &AppState, room_id: Uuid, client_id: Uuid) -> Option<RoomMember> {
    let mut rooms = state.rooms.write().await;
    let room = rooms.get_mut(&room_id)?;

    room.clients.remove(&client_id);
    let member = room.members.remove(&client_id);
    if let Some(member) = &member {
        room.typing.remove(&member.session_id);
    }
    info!(%room_id, %client_id, remaining = room.clients.len(), "client left room");

    if room.clients.is_empty() {
        rooms.remove(&room_id);
        info!(%room_id, "evicted room state from memory");
    }
    member
}

// =============================================================================
// BROADCAST
// =============================================================================

/// Broadcast a frame to all clients in a room, optionally excluding one.
pub async fn broadcast(state: &AppState, room_id: Uuid, frame: &Frame, exclude: Option<Uuid>) {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(&room_id) else {
        return;
    };

    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        // Best-effort: if a client's channel is full, skip it.
        let _ = tx.try_send(frame.clone());
    }
}

/// Broadcast a frame to every connected socket, joined to a room or not.
/// Used for presence syncs and room-directory refresh pushes.
pub async fn broadcast_all(state: &AppState, frame: &Frame) {
    let sockets = state.sockets.read().await;
    for tx in sockets.values() {
        let _ = tx.try_send(frame.clone());
    }
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;
