use super::*;

#[test]
fn status_whitelist() {
    for value in ["pending", "achieved", "failed"] {
        assert!(valid_status(value), "{value} should be valid");
    }
    for value in ["done", "Pending", ""] {
        assert!(!valid_status(value), "{value:?} should be invalid");
    }
}

#[test]
fn rating_range() {
    assert!(valid_rating(None));
    for r in 1..=5 {
        assert!(valid_rating(Some(r)), "{r} should be valid");
    }
    assert!(!valid_rating(Some(0)));
    assert!(!valid_rating(Some(6)));
    assert!(!valid_rating(Some(-3)));
}

#[test]
fn date_strings_must_be_iso() {
    assert!(valid_iso_date("2026-08-23"));
    for value in ["23-08-2026", "2026-13-01", "2026-02-30", "yesterday", ""] {
        assert!(!valid_iso_date(value), "{value:?} should be rejected");
    }
}

#[test]
fn update_body_fields_all_optional() {
    let parsed: UpdateTargetBody = serde_json::from_value(serde_json::json!({})).unwrap();
    assert!(parsed.target.is_none());
    assert!(parsed.status.is_none());
    assert!(parsed.productivity_rating.is_none());
    assert!(parsed.study_seconds.is_none());
}
