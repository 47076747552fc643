use super::*;

#[test]
fn room_state_new_is_empty() {
    let rs = RoomState::new();
    assert!(rs.clients.is_empty());
    assert!(rs.members.is_empty());
    assert!(rs.typing.is_empty());
}

#[test]
fn room_state_default_equals_new() {
    let a = RoomState::new();
    let b = RoomState::default();
    assert_eq!(a.clients.len(), b.clients.len());
    assert_eq!(a.members.len(), b.members.len());
    assert_eq!(a.typing.len(), b.typing.len());
}

#[tokio::test]
async fn app_state_starts_empty() {
    let state = test_helpers::test_app_state();
    assert!(state.rooms.read().await.is_empty());
    assert!(state.sockets.read().await.is_empty());
    assert!(state.presence.read().await.is_empty());
}

#[tokio::test]
async fn seed_member_registers_everywhere() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;
    let (client_id, _rx) = test_helpers::seed_member(&state, room_id, "guest_1", "Asha").await;

    let rooms = state.rooms.read().await;
    let room = rooms.get(&room_id).expect("room should exist");
    assert!(room.clients.contains_key(&client_id));
    assert_eq!(room.members.get(&client_id).map(|m| m.display_name.as_str()), Some("Asha"));

    let presence = state.presence.read().await;
    let record = presence.get("guest_1").expect("presence record should exist");
    assert!(record.online);
    assert_eq!(record.room_id, Some(room_id));
    assert_eq!(record.client_id, client_id);

    assert!(state.sockets.read().await.contains_key(&client_id));
}
