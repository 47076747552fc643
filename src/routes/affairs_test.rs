use super::*;

#[test]
fn importance_whitelist() {
    for value in ["High", "Medium", "Low"] {
        assert!(valid_importance(value), "{value} should be valid");
    }
    for value in ["high", "URGENT", "", "medium "] {
        assert!(!valid_importance(value), "{value:?} should be invalid");
    }
}

fn body(importance: &str, title: &str) -> AffairBody {
    AffairBody {
        title: title.to_owned(),
        summary: "Summary text".to_owned(),
        category: "Polity".to_owned(),
        date: "2026-08-23".to_owned(),
        source: "The Hindu".to_owned(),
        source_url: None,
        importance: importance.to_owned(),
        tags: vec!["governance".to_owned()],
    }
}

#[test]
fn validation_rejects_blank_title_and_bad_importance() {
    assert!(validate_affair(&body("High", "Parliament session")).is_ok());
    assert_eq!(validate_affair(&body("High", "   ")), Err(StatusCode::BAD_REQUEST));
    assert_eq!(validate_affair(&body("urgent", "Parliament session")), Err(StatusCode::BAD_REQUEST));
}

#[test]
fn validation_rejects_malformed_date() {
    let mut affair = body("High", "Parliament session");
    affair.date = "23-08-2026".to_owned();
    assert_eq!(validate_affair(&affair), Err(StatusCode::BAD_REQUEST));
}

#[test]
fn tags_default_to_empty() {
    let parsed: AffairBody = serde_json::from_value(serde_json::json!({
        "title": "t", "summary": "s", "category": "c",
        "date": "2026-01-01", "source": "src", "importance": "Low"
    }))
    .unwrap();
    assert!(parsed.tags.is_empty());
    assert_eq!(parsed.source_url, None);
}
