//! Presence tracker — per-guest online/room records and count fan-out.
//!
//! DESIGN
//! ======
//! Records are keyed by the guest session id the client presents at
//! connect time. Last writer wins per key: a second tab presenting the
//! same session id takes ownership of the record (its `client_id` is
//! stamped in), and the older tab's disconnect only flips the record
//! offline if it still owns it. Every change recomputes the full summary
//! and pushes a `presence:sync` snapshot to all connected sockets —
//! subscribers always receive the full current value, never a delta.

use std::collections::HashMap;

use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::state::{AppState, PresenceRecord};

/// Aggregate counts recomputed from the full presence table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceSummary {
    pub total_online: usize,
    pub per_room: HashMap<Uuid, usize>,
}

/// Mark a guest online with no current room. Steals the record if another
/// connection holds the same session id.
pub async fn connect(state: &AppState, session_id: &str, client_id: Uuid) {
    let mut presence = state.presence.write().await;
    presence.insert(
        session_id.to_owned(),
        PresenceRecord { online: true, room_id: None, client_id },
    );
}

/// Point a guest's record at a room (or at no room). Overwrites on every
/// room switch.
pub async fn set_room(state: &AppState, session_id: &str, client_id: Uuid, room_id: Option<Uuid>) {
    let mut presence = state.presence.write().await;
    presence.insert(
        session_id.to_owned(),
        PresenceRecord { online: true, room_id, client_id },
    );
}

/// Disconnect hook: flip the record offline, but only if this connection
/// still owns it. A newer tab with the same session id keeps its record.
pub async fn disconnect(state: &AppState, session_id: &str, client_id: Uuid) {
    let mut presence = state.presence.write().await;
    if let Some(record) = presence.get_mut(session_id) {
        if record.client_id == client_id {
            record.online = false;
            record.room_id = None;
        }
    }
}

/// Recompute aggregate counts from the full presence table.
/// O(connected guests) per call, acceptable at this scale.
pub async fn summary(state: &AppState) -> PresenceSummary {
    let presence = state.presence.read().await;
    let mut total_online = 0;
    let mut per_room: HashMap<Uuid, usize> = HashMap::new();
    for record in presence.values() {
        if record.online {
            total_online += 1;
            if let Some(room_id) = record.room_id {
                *per_room.entry(room_id).or_default() += 1;
            }
        }
    }
    PresenceSummary { total_online, per_room }
}

/// Build the `presence:sync` push frame from a summary snapshot.
#[must_use]
pub fn sync_frame(summary: &PresenceSummary) -> Frame {
    let rooms: serde_json::Map<String, serde_json::Value> = summary
        .per_room
        .iter()
        .map(|(room_id, count)| (room_id.to_string(), serde_json::json!(count)))
        .collect();

    let mut data = Data::new();
    data.insert("total".into(), serde_json::json!(summary.total_online));
    data.insert("rooms".into(), serde_json::Value::Object(rooms));
    Frame::request("presence:sync", data)
}

/// Recompute and push the presence snapshot to every connected socket.
pub async fn broadcast_sync(state: &AppState) {
    let snapshot = summary(state).await;
    let frame = sync_frame(&snapshot);
    crate::services::room::broadcast_all(state, &frame).await;
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
