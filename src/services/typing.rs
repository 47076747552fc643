//! Typing indicator — per-room typing map with server-side expiry.
//!
//! DESIGN
//! ======
//! Each keystroke refreshes the sender's entry with a fresh TTL (~2s).
//! A background sweeper drops entries whose TTL has passed and pushes the
//! cleared snapshot to the room, so a tab closed mid-type cannot leave a
//! stale "is typing" banner behind. Sending a message clears the sender's
//! entry synchronously with the send.

use std::collections::HashMap;

use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::frame::{Data, Frame, now_ms};
use crate::state::{AppState, TypingEntry};

const DEFAULT_TYPING_TTL_MS: i64 = 2_000;
const DEFAULT_SWEEP_INTERVAL_MS: u64 = 500;

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Typing TTL in milliseconds (`TYPING_TTL_MS`, default 2000).
#[must_use]
pub fn ttl_ms() -> i64 {
    env_parse("TYPING_TTL_MS", DEFAULT_TYPING_TTL_MS)
}

/// Set or clear a guest's typing entry in a room's map.
/// Returns true if the visible snapshot changed.
pub async fn set_typing(
    state: &AppState,
    room_id: Uuid,
    session_id: &str,
    display_name: &str,
    is_typing: bool,
) -> bool {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&room_id) else {
        return false;
    };

    if is_typing {
        room.typing
            .insert(
                session_id.to_owned(),
                TypingEntry { display_name: display_name.to_owned(), expires_at_ms: now_ms() + ttl_ms() },
            )
            .is_none()
    } else {
        room.typing.remove(session_id).is_some()
    }
}

/// Remove a guest's typing entry. Returns true if one was present.
pub async fn clear_typing(state: &AppState, room_id: Uuid, session_id: &str) -> bool {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(&room_id) else {
        return false;
    };
    room.typing.remove(session_id).is_some()
}

/// Current unexpired typing entries for a room: `session_id -> display_name`.
pub async fn snapshot(state: &AppState, room_id: Uuid) -> HashMap<String, String> {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(&room_id) else {
        return HashMap::new();
    };
    let now = now_ms();
    room.typing
        .iter()
        .filter(|(_, entry)| entry.expires_at_ms > now)
        .map(|(session_id, entry)| (session_id.clone(), entry.display_name.clone()))
        .collect()
}

/// Build the `typing:sync` push frame from a snapshot.
#[must_use]
pub fn sync_frame(room_id: Uuid, users: &HashMap<String, String>) -> Frame {
    let users: serde_json::Map<String, serde_json::Value> = users
        .iter()
        .map(|(session_id, name)| (session_id.clone(), serde_json::json!(name)))
        .collect();

    let mut data = Data::new();
    data.insert("users".into(), serde_json::Value::Object(users));
    Frame::request("typing:sync", data).with_room_id(room_id)
}

/// Drop expired entries across all live rooms. Returns the ids of rooms
/// whose typing map changed.
pub async fn sweep_expired(state: &AppState, now: i64) -> Vec<Uuid> {
    let mut rooms = state.rooms.write().await;
    let mut changed = Vec::new();
    for (room_id, room) in rooms.iter_mut() {
        let before = room.typing.len();
        room.typing.retain(|_, entry| entry.expires_at_ms > now);
        if room.typing.len() != before {
            changed.push(*room_id);
        }
    }
    changed
}

/// Spawn the background typing sweeper. Returns a handle for shutdown.
pub fn spawn_typing_sweeper(state: AppState) -> JoinHandle<()> {
    let interval_ms: u64 = env_parse("TYPING_SWEEP_INTERVAL_MS", DEFAULT_SWEEP_INTERVAL_MS);
    info!(interval_ms, ttl_ms = ttl_ms(), "typing sweeper configured");
    tokio::spawn(async move {
        loop {
            let changed = sweep_expired(&state, now_ms()).await;
            for room_id in changed {
                let users = snapshot(&state, room_id).await;
                let frame = sync_frame(room_id, &users);
                crate::services::room::broadcast(&state, room_id, &frame, None).await;
            }
            tokio::time::sleep(std::time::Duration::from_millis(interval_ms)).await;
        }
    })
}

#[cfg(test)]
#[path = "typing_test.rs"]
mod tests;
