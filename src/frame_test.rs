use super::*;

#[test]
fn request_sets_fields() {
    let frame = Frame::request("room:create", Data::new());
    assert_eq!(frame.op, "room:create");
    assert_eq!(frame.status, Status::Request);
    assert!(frame.parent_id.is_none());
    assert!(frame.room_id.is_none());
    assert!(frame.ts > 0);
}

#[test]
fn reply_inherits_context() {
    let room_id = Uuid::new_v4();
    let req = Frame::request("message:send", Data::new()).with_room_id(room_id);
    let item = req.item(Data::new());

    assert_eq!(item.parent_id, Some(req.id));
    assert_eq!(item.room_id, Some(room_id));
    assert_eq!(item.op, "message:send");
    assert_eq!(item.status, Status::Item);
}

#[test]
fn done_with_carries_data() {
    let req = Frame::request("room:list", Data::new());
    let done = req.done_with(Data::from([("rooms".to_string(), serde_json::json!([]))]));
    assert_eq!(done.status, Status::Done);
    assert!(done.data.contains_key("rooms"));
    assert_eq!(done.parent_id, Some(req.id));
}

#[test]
fn terminal_statuses() {
    assert!(Status::Done.is_terminal());
    assert!(Status::Error.is_terminal());
    assert!(!Status::Request.is_terminal());
    assert!(!Status::Item.is_terminal());
}

#[test]
fn prefix_and_verb_extraction() {
    let frame = Frame::request("typing:set", Data::new());
    assert_eq!(frame.prefix(), "typing");
    assert_eq!(frame.verb(), "set");

    let frame = Frame::request("noseparator", Data::new());
    assert_eq!(frame.prefix(), "noseparator");
    assert_eq!(frame.verb(), "");
}

#[test]
fn json_round_trip() {
    let room_id = Uuid::new_v4();
    let original = Frame::request("room:join", Data::new())
        .with_room_id(room_id)
        .with_from("guest_ab12cd")
        .with_data("display_name", "Bee");

    let json = serde_json::to_string(&original).expect("serialize");
    let restored: Frame = serde_json::from_str(&json).expect("deserialize");

    assert_eq!(restored.id, original.id);
    assert_eq!(restored.room_id, Some(room_id));
    assert_eq!(restored.op, "room:join");
    assert_eq!(restored.from.as_deref(), Some("guest_ab12cd"));
    assert_eq!(
        restored.data.get("display_name").and_then(|v| v.as_str()),
        Some("Bee")
    );
}

#[test]
fn room_id_omitted_from_json_when_none() {
    let frame = Frame::request("room:list", Data::new());
    let json = serde_json::to_string(&frame).expect("serialize");
    assert!(!json.contains("room_id"));
}

#[test]
fn error_from_typed() {
    #[derive(Debug, thiserror::Error)]
    #[error("wrong password")]
    struct WrongPassword;

    impl ErrorCode for WrongPassword {
        fn error_code(&self) -> &'static str {
            "E_PASSWORD"
        }
    }

    let req = Frame::request("room:join", Data::new());
    let err = req.error_from(&WrongPassword);

    assert_eq!(err.status, Status::Error);
    assert_eq!(err.data.get("code").and_then(|v| v.as_str()), Some("E_PASSWORD"));
    assert_eq!(err.data.get("message").and_then(|v| v.as_str()), Some("wrong password"));
    assert_eq!(
        err.data.get("retryable").and_then(serde_json::Value::as_bool),
        Some(false)
    );
}

#[test]
fn plain_error_has_message_only() {
    let req = Frame::request("message:send", Data::new());
    let err = req.error("must join a room first");
    assert_eq!(err.status, Status::Error);
    assert_eq!(
        err.data.get("message").and_then(|v| v.as_str()),
        Some("must join a room first")
    );
    assert!(!err.data.contains_key("code"));
}
