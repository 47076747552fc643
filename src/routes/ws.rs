//! WebSocket handler — chat-room frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, the client presents its persistent guest session id (or the
//! server mints one) and enters a `select!` loop:
//! - Incoming client frames → parse + dispatch by op prefix
//! - Push frames from room peers / presence fan-out → forward to client
//!
//! Handler functions are pure business logic — they validate, mutate state,
//! and return an `Outcome`. The dispatch layer owns all outbound concerns:
//! reply to sender and broadcast to peers.
//!
//! The connection state is an explicit tagged union: `Lobby` or
//! `Joined { room_id, display_name }`. `room:join` is the only transition
//! in, and it requires a resolved display name and a passed password gate,
//! so "joined without a name" is unrepresentable.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → presence online → `session:connected` with ids
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / broadcast / both)
//! 4. Close → `room:part` + typing/presence cleanup + syncs

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame, now_ms};
use crate::services::{message, presence, room, typing};
use crate::state::{AppState, RoomMember};

// =============================================================================
// CONNECTION STATE
// =============================================================================

/// Where this connection stands in the room lifecycle.
enum ConnState {
    /// Connected, browsing the directory, not in any room.
    Lobby,
    /// Passed the password gate with a resolved display name.
    Joined { room_id: Uuid, display_name: String },
}

impl ConnState {
    fn room_id(&self) -> Option<Uuid> {
        match self {
            ConnState::Lobby => None,
            ConnState::Joined { room_id, .. } => Some(*room_id),
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what — handlers never send reply frames directly.
enum Outcome {
    /// Send done+data to the sender (correlated via `parent_id`) and push
    /// the same payload to room peers as a plain request frame.
    Broadcast(Data),
    /// Push an op+data to room peers EXCLUDING sender; sender gets a bare
    /// done. Used for typing snapshots (ephemeral, never persisted).
    BroadcastExcludeSender { op: &'static str, data: Data },
    /// Send done+data to sender only.
    Reply(Data),
    /// Send empty done to sender only.
    Done,
    /// Reply to sender with one payload, push a different op+data to peers.
    ReplyAndBroadcast { reply: Data, op: &'static str, broadcast: Data },
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    // The guest session id is an explicit value passed by the client
    // (persisted on its side); mint one for first-time visitors.
    let session_id = params
        .get("session")
        .map(String::as_str)
        .filter(|s| !s.trim().is_empty())
        .map_or_else(mint_session_id, str::to_owned);

    ws.on_upgrade(move |socket| run_ws(socket, state, session_id))
}

fn mint_session_id() -> String {
    format!("guest_{}", &Uuid::new_v4().simple().to_string()[..12])
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState, session_id: String) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving push frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(256);

    {
        let mut sockets = state.sockets.write().await;
        sockets.insert(client_id, client_tx.clone());
    }
    presence::connect(&state, &session_id, client_id).await;
    presence::broadcast_sync(&state).await;

    let welcome = Frame::request("session:connected", Data::new())
        .with_data("client_id", client_id.to_string())
        .with_data("session_id", session_id.clone());
    if send_frame(&mut socket, &welcome).await.is_err() {
        cleanup(&state, &ConnState::Lobby, client_id, &session_id).await;
        return;
    }

    info!(%client_id, session_id, "ws: client connected");

    let mut conn = ConnState::Lobby;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(msg) = msg else { break };
                let Ok(msg) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, &mut conn, client_id, &session_id, &client_tx, &text).await;
                        for frame in replies {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    cleanup(&state, &conn, client_id, &session_id).await;
    info!(%client_id, "ws: client disconnected");
}

/// Disconnect path: part the room, clear typing, flip presence, fan out syncs.
async fn cleanup(state: &AppState, conn: &ConnState, client_id: Uuid, session_id: &str) {
    if let ConnState::Joined { room_id, display_name } = conn {
        let part = Frame::request("room:part", Data::new())
            .with_room_id(*room_id)
            .with_data("session_id", session_id)
            .with_data("display_name", display_name.as_str());
        room::broadcast(state, *room_id, &part, Some(client_id)).await;

        // leave_live drops this client's typing entry with it.
        room::leave_live(state, *room_id, client_id).await;
        let users = typing::snapshot(state, *room_id).await;
        room::broadcast(state, *room_id, &typing::sync_frame(*room_id, &users), None).await;
    }

    presence::disconnect(state, session_id, client_id).await;
    {
        let mut sockets = state.sockets.write().await;
        sockets.remove(&client_id);
    }
    presence::broadcast_sync(state).await;
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame, returning frames for the
/// sender. Split from the socket loop so tests can drive dispatch without
/// a live websocket.
async fn process_inbound_text(
    state: &AppState,
    conn: &mut ConnState,
    client_id: Uuid,
    session_id: &str,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data("message", format!("invalid json: {e}"));
            return vec![err];
        }
    };

    // Stamp the authenticated-by-connection session id as `from`.
    req.from = Some(session_id.to_owned());

    let prefix = req.prefix();
    let is_typing_op = prefix == "typing";
    if !is_typing_op {
        info!(%client_id, id = %req.id, op = %req.op, status = ?req.status, "ws: recv frame");
    }

    let result = match prefix {
        "room" => handle_room(state, conn, client_id, session_id, client_tx, &req).await,
        "message" => handle_message(state, conn, client_id, session_id, &req).await,
        "typing" => handle_typing(state, conn, session_id, &req).await,
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    // Apply outcome — the dispatch layer owns all outbound logic.
    let room_id = conn.room_id();
    match result {
        Ok(Outcome::Broadcast(data)) => {
            // Peers get a plain request push; only the sender's copy
            // correlates back to the originating frame.
            if let Some(rid) = room_id {
                let peer_frame = Frame::request(req.op.clone(), data.clone()).with_room_id(rid);
                room::broadcast(state, rid, &peer_frame, Some(client_id)).await;
            }
            vec![req.done_with(data)]
        }
        Ok(Outcome::BroadcastExcludeSender { op, data }) => {
            if let Some(rid) = room_id {
                let frame = Frame::request(op, data).with_room_id(rid);
                room::broadcast(state, rid, &frame, Some(client_id)).await;
            }
            vec![req.done()]
        }
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::ReplyAndBroadcast { reply, op, broadcast }) => {
            let sender_frame = req.done_with(reply);
            if let Some(rid) = room_id {
                let notif = Frame::request(op, broadcast).with_room_id(rid);
                room::broadcast(state, rid, &notif, Some(client_id)).await;
            }
            vec![sender_frame]
        }
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_room(
    state: &AppState,
    conn: &mut ConnState,
    client_id: Uuid,
    session_id: &str,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.verb() {
        "create" => {
            let name = req.data.get("name").and_then(|v| v.as_str()).unwrap_or_default();
            let password = req.data.get("password").and_then(|v| v.as_str());

            match room::create_room(&state.pool, name, password, Some(session_id)).await {
                Ok(row) => {
                    // Everyone re-pulls the directory on the next refresh push.
                    broadcast_room_list_refresh(state).await;

                    let mut data = Data::new();
                    data.insert("id".into(), serde_json::json!(row.id));
                    data.insert("name".into(), serde_json::json!(row.name));
                    data.insert("has_password".into(), serde_json::json!(row.has_password));
                    Ok(Outcome::Reply(data))
                }
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "list" => {
            let rooms = match room::list_rooms(&state.pool).await {
                Ok(rooms) => rooms,
                Err(e) => return Err(req.error_from(&e)),
            };
            let counts = presence::summary(state).await;

            let list: Vec<serde_json::Value> = rooms
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "id": r.id,
                        "name": r.name,
                        "has_password": r.has_password,
                        "online": counts.per_room.get(&r.id).copied().unwrap_or(0),
                    })
                })
                .collect();

            let mut data = Data::new();
            data.insert("rooms".into(), serde_json::json!(list));
            data.insert("total_online".into(), serde_json::json!(counts.total_online));
            Ok(Outcome::Reply(data))
        }
        "join" => handle_room_join(state, conn, client_id, session_id, client_tx, req).await,
        "leave" => {
            let ConnState::Joined { room_id, display_name } = conn else {
                return Err(req.error("not in a room"));
            };
            let (room_id, display_name) = (*room_id, display_name.clone());

            part_room(state, room_id, client_id, session_id, &display_name).await;
            *conn = ConnState::Lobby;

            presence::set_room(state, session_id, client_id, None).await;
            presence::broadcast_sync(state).await;
            Ok(Outcome::Done)
        }
        verb => Err(req.error(format!("unknown room op: {verb}"))),
    }
}

async fn handle_room_join(
    state: &AppState,
    conn: &mut ConnState,
    client_id: Uuid,
    session_id: &str,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let Some(room_id) = req.room_id.or_else(|| {
        req.data
            .get("room_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }) else {
        return Err(req.error("room_id required"));
    };

    let display_name = req
        .data
        .get("display_name")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or_default();
    if display_name.is_empty() {
        return Err(req.error_from(&room::RoomError::NameRequired));
    }

    let password = req.data.get("password").and_then(|v| v.as_str());

    // Password gate first: a rejected join must leave the connection
    // exactly where it was, including any currently joined room.
    let row = match room::verify_join(&state.pool, room_id, password).await {
        Ok(row) => row,
        Err(e) => return Err(req.error_from(&e)),
    };

    // History is fetched before any state changes. Every fallible step
    // runs up front, so an error frame from this handler means nothing
    // moved: no part broadcast, no membership, no presence bump.
    let history = match message::list_messages(&state.pool, room_id).await {
        Ok(history) => history,
        Err(e) => return Err(req.error_from(&e)),
    };

    // Switching rooms parts the old one first.
    if let ConnState::Joined { room_id: old_room, display_name: old_name } = conn {
        let (old_room, old_name) = (*old_room, old_name.clone());
        part_room(state, old_room, client_id, session_id, &old_name).await;
    }

    let members = room::join_live(
        state,
        room_id,
        client_id,
        client_tx.clone(),
        RoomMember { session_id: session_id.to_owned(), display_name: display_name.to_owned() },
    )
    .await;
    *conn = ConnState::Joined { room_id, display_name: display_name.to_owned() };

    presence::set_room(state, session_id, client_id, Some(room_id)).await;
    presence::broadcast_sync(state).await;

    let typing_users = typing::snapshot(state, room_id).await;

    let mut reply = Data::new();
    reply.insert(
        "room".into(),
        serde_json::json!({ "id": row.id, "name": row.name, "has_password": row.has_password }),
    );
    reply.insert("messages".into(), serde_json::to_value(&history).unwrap_or_default());
    reply.insert(
        "members".into(),
        serde_json::json!(
            members
                .iter()
                .map(|m| serde_json::json!({ "session_id": m.session_id, "display_name": m.display_name }))
                .collect::<Vec<_>>()
        ),
    );
    reply.insert("typing".into(), serde_json::json!(typing_users));

    let mut broadcast = Data::new();
    broadcast.insert("session_id".into(), serde_json::json!(session_id));
    broadcast.insert("display_name".into(), serde_json::json!(display_name));

    Ok(Outcome::ReplyAndBroadcast { reply, op: "room:join", broadcast })
}

/// Shared leave path: notify peers, drop live membership, push the typing
/// snapshot the departure may have changed.
async fn part_room(state: &AppState, room_id: Uuid, client_id: Uuid, session_id: &str, display_name: &str) {
    let part = Frame::request("room:part", Data::new())
        .with_room_id(room_id)
        .with_data("session_id", session_id)
        .with_data("display_name", display_name);
    room::broadcast(state, room_id, &part, Some(client_id)).await;

    room::leave_live(state, room_id, client_id).await;
    let users = typing::snapshot(state, room_id).await;
    room::broadcast(state, room_id, &typing::sync_frame(room_id, &users), None).await;
}

/// Push a directory-refresh hint to every connected socket.
async fn broadcast_room_list_refresh(state: &AppState) {
    let frame = Frame::request("room:list:refresh", Data::new());
    room::broadcast_all(state, &frame).await;
}

// =============================================================================
// MESSAGE HANDLER
// =============================================================================

async fn handle_message(
    state: &AppState,
    conn: &ConnState,
    client_id: Uuid,
    session_id: &str,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let ConnState::Joined { room_id, display_name } = conn else {
        return Err(req.error("must join a room first"));
    };
    let room_id = *room_id;

    match req.verb() {
        "send" => {
            let content = req.data.get("content").and_then(|v| v.as_str()).unwrap_or_default();
            // Client-supplied timestamp is honored for display ordering;
            // skewed clocks may render out of send order.
            let created_at = req
                .data
                .get("created_at")
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_else(now_ms);

            let msg = match message::append_message(&state.pool, room_id, display_name, content, created_at).await {
                Ok(msg) => msg,
                Err(e) => return Err(req.error_from(&e)),
            };

            // Sending clears the author's typing flag synchronously; peers
            // see the cleared snapshot before (or with) the message itself.
            if typing::clear_typing(state, room_id, session_id).await {
                let users = typing::snapshot(state, room_id).await;
                room::broadcast(state, room_id, &typing::sync_frame(room_id, &users), Some(client_id)).await;
            }

            Ok(Outcome::Broadcast(message::to_data(&msg)))
        }
        verb => Err(req.error(format!("unknown message op: {verb}"))),
    }
}

// =============================================================================
// TYPING HANDLER
// =============================================================================

async fn handle_typing(
    state: &AppState,
    conn: &ConnState,
    session_id: &str,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let ConnState::Joined { room_id, display_name } = conn else {
        // Silently ignore typing signals before joining.
        return Ok(Outcome::Done);
    };
    let room_id = *room_id;

    match req.verb() {
        "set" => {
            let is_typing = req
                .data
                .get("typing")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);

            typing::set_typing(state, room_id, session_id, display_name, is_typing).await;

            let users = typing::snapshot(state, room_id).await;
            let mut data = Data::new();
            data.insert("users".into(), serde_json::json!(users));
            Ok(Outcome::BroadcastExcludeSender { op: "typing:sync", data })
        }
        verb => Err(req.error(format!("unknown typing op: {verb}"))),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    let is_typing_op = frame.op.starts_with("typing:");
    if !is_typing_op {
        if frame.status == crate::frame::Status::Error {
            let code = frame.data.get("code").and_then(|v| v.as_str()).unwrap_or("-");
            let message = frame.data.get("message").and_then(|v| v.as_str()).unwrap_or("-");
            warn!(id = %frame.id, op = %frame.op, code, message, "ws: send frame status=Error");
        } else {
            info!(id = %frame.id, op = %frame.op, status = ?frame.status, "ws: send frame");
        }
    }
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
