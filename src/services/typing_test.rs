use super::*;
use crate::frame::now_ms;
use crate::state::test_helpers;

#[tokio::test]
async fn set_typing_adds_entry_with_ttl() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;

    let changed = set_typing(&state, room_id, "guest_b", "Bee", true).await;
    assert!(changed);

    let users = snapshot(&state, room_id).await;
    assert_eq!(users.get("guest_b").map(String::as_str), Some("Bee"));

    let rooms = state.rooms.read().await;
    let entry = rooms.get(&room_id).unwrap().typing.get("guest_b").unwrap();
    assert!(entry.expires_at_ms > now_ms());
}

#[tokio::test]
async fn repeated_keystrokes_refresh_without_reporting_change() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;

    assert!(set_typing(&state, room_id, "guest_b", "Bee", true).await);
    // Entry already visible; a refresh should not signal a snapshot change.
    assert!(!set_typing(&state, room_id, "guest_b", "Bee", true).await);
    assert_eq!(snapshot(&state, room_id).await.len(), 1);
}

#[tokio::test]
async fn explicit_clear_removes_entry() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;

    set_typing(&state, room_id, "guest_b", "Bee", true).await;
    assert!(set_typing(&state, room_id, "guest_b", "Bee", false).await);
    assert!(snapshot(&state, room_id).await.is_empty());

    // Clearing again is a no-op.
    assert!(!clear_typing(&state, room_id, "guest_b").await);
}

#[tokio::test]
async fn set_typing_in_unknown_room_is_noop() {
    let state = test_helpers::test_app_state();
    assert!(!set_typing(&state, Uuid::new_v4(), "guest_b", "Bee", true).await);
}

#[tokio::test]
async fn sweep_drops_entries_past_ttl() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;
    set_typing(&state, room_id, "guest_b", "Bee", true).await;

    // Nothing expired yet.
    assert!(sweep_expired(&state, now_ms()).await.is_empty());

    // Jump past the TTL: the entry is swept and the room reported changed.
    let changed = sweep_expired(&state, now_ms() + ttl_ms() + 1).await;
    assert_eq!(changed, vec![room_id]);
    assert!(snapshot(&state, room_id).await.is_empty());

    // Second sweep reports nothing.
    assert!(sweep_expired(&state, now_ms() + ttl_ms() + 1).await.is_empty());
}

#[tokio::test]
async fn sweep_keeps_fresh_entries() {
    let state = test_helpers::test_app_state();
    let room_id = test_helpers::seed_room(&state).await;
    set_typing(&state, room_id, "guest_a", "Asha", true).await;

    {
        let mut rooms = state.rooms.write().await;
        rooms.get_mut(&room_id).unwrap().typing.insert(
            "guest_old".into(),
            crate::state::TypingEntry { display_name: "Old".into(), expires_at_ms: now_ms() - 1 },
        );
    }

    let changed = sweep_expired(&state, now_ms()).await;
    assert_eq!(changed, vec![room_id]);

    let users = snapshot(&state, room_id).await;
    assert_eq!(users.len(), 1);
    assert!(users.contains_key("guest_a"));
}

#[test]
fn sync_frame_shape() {
    let room_id = Uuid::new_v4();
    let mut users = HashMap::new();
    users.insert("guest_b".to_string(), "Bee".to_string());

    let frame = sync_frame(room_id, &users);
    assert_eq!(frame.op, "typing:sync");
    assert_eq!(frame.room_id, Some(room_id));
    assert_eq!(
        frame.data.get("users").and_then(|v| v.get("guest_b")).and_then(|v| v.as_str()),
        Some("Bee")
    );
}

#[test]
fn env_parse_falls_back_on_garbage() {
    assert_eq!(env_parse("TYPING_TEST_MISSING_VAR", 7u64), 7);
}
