use super::*;
use crate::frame::Status;
use crate::state::test_helpers;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn connect_marks_guest_online_with_no_room() {
    let state = test_helpers::test_app_state();
    connect(&state, "guest_a", Uuid::new_v4()).await;

    let snapshot = summary(&state).await;
    assert_eq!(snapshot.total_online, 1);
    assert!(snapshot.per_room.is_empty());
}

#[tokio::test]
async fn set_room_moves_the_count() {
    let state = test_helpers::test_app_state();
    let client_id = Uuid::new_v4();
    let room_a = Uuid::new_v4();
    let room_b = Uuid::new_v4();

    connect(&state, "guest_a", client_id).await;
    set_room(&state, "guest_a", client_id, Some(room_a)).await;
    assert_eq!(summary(&state).await.per_room.get(&room_a), Some(&1));

    // Room switch overwrites the record; the old room's count drops.
    set_room(&state, "guest_a", client_id, Some(room_b)).await;
    let snapshot = summary(&state).await;
    assert_eq!(snapshot.per_room.get(&room_a), None);
    assert_eq!(snapshot.per_room.get(&room_b), Some(&1));
    assert_eq!(snapshot.total_online, 1);
}

#[tokio::test]
async fn disconnect_flips_record_offline() {
    let state = test_helpers::test_app_state();
    let client_id = Uuid::new_v4();
    let room_id = Uuid::new_v4();

    connect(&state, "guest_a", client_id).await;
    set_room(&state, "guest_a", client_id, Some(room_id)).await;
    disconnect(&state, "guest_a", client_id).await;

    let snapshot = summary(&state).await;
    assert_eq!(snapshot.total_online, 0);
    assert!(snapshot.per_room.is_empty());
}

#[tokio::test]
async fn stale_disconnect_does_not_clobber_newer_tab() {
    let state = test_helpers::test_app_state();
    let old_tab = Uuid::new_v4();
    let new_tab = Uuid::new_v4();

    // Same guest id from two tabs: the newer connection owns the record.
    connect(&state, "guest_a", old_tab).await;
    connect(&state, "guest_a", new_tab).await;

    // The older tab's disconnect hook fires afterwards and must not win.
    disconnect(&state, "guest_a", old_tab).await;

    let snapshot = summary(&state).await;
    assert_eq!(snapshot.total_online, 1);
}

#[tokio::test]
async fn room_count_equals_online_records_pointing_at_it() {
    let state = test_helpers::test_app_state();
    let room_id = Uuid::new_v4();
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();

    connect(&state, "guest_a", a).await;
    set_room(&state, "guest_a", a, Some(room_id)).await;
    connect(&state, "guest_b", b).await;
    set_room(&state, "guest_b", b, Some(room_id)).await;
    connect(&state, "guest_c", c).await; // online, not in the room

    assert_eq!(summary(&state).await.per_room.get(&room_id), Some(&2));

    // Simulated disconnect: count recomputes correctly.
    disconnect(&state, "guest_b", b).await;
    let snapshot = summary(&state).await;
    assert_eq!(snapshot.per_room.get(&room_id), Some(&1));
    assert_eq!(snapshot.total_online, 2);
}

#[test]
fn sync_frame_carries_full_snapshot() {
    let mut per_room = std::collections::HashMap::new();
    let room_id = Uuid::new_v4();
    per_room.insert(room_id, 3);
    let frame = sync_frame(&PresenceSummary { total_online: 5, per_room });

    assert_eq!(frame.op, "presence:sync");
    assert_eq!(frame.status, Status::Request);
    assert_eq!(frame.data.get("total").and_then(serde_json::Value::as_u64), Some(5));
    assert_eq!(
        frame.data.get("rooms").and_then(|v| v.get(room_id.to_string())).and_then(serde_json::Value::as_u64),
        Some(3)
    );
}

#[tokio::test]
async fn broadcast_sync_reaches_every_socket() {
    let state = test_helpers::test_app_state();
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    {
        let mut sockets = state.sockets.write().await;
        sockets.insert(Uuid::new_v4(), tx_a);
        sockets.insert(Uuid::new_v4(), tx_b);
    }
    connect(&state, "guest_a", Uuid::new_v4()).await;

    broadcast_sync(&state).await;

    for rx in [&mut rx_a, &mut rx_b] {
        let frame = timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("sync timed out")
            .expect("channel closed");
        assert_eq!(frame.op, "presence:sync");
        assert_eq!(frame.data.get("total").and_then(serde_json::Value::as_u64), Some(1));
    }
}
