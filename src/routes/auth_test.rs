use super::*;

// =============================================================================
// env_bool — uses unique env var names to avoid races with parallel tests.
// =============================================================================

#[test]
fn env_bool_true_variants() {
    for (i, val) in ["1", "true", "yes", "on"].iter().enumerate() {
        let key = format!("__TEST_EB_TRUE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(true), "expected true for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_false_variants() {
    for (i, val) in ["0", "false", "no", "off"].iter().enumerate() {
        let key = format!("__TEST_EB_FALSE_{i}__");
        unsafe { std::env::set_var(&key, val) };
        assert_eq!(env_bool(&key), Some(false), "expected false for {val:?}");
        unsafe { std::env::remove_var(&key) };
    }
}

#[test]
fn env_bool_invalid_returns_none() {
    let key = "__TEST_EB_INVALID_4417__";
    unsafe { std::env::set_var(key, "maybe") };
    assert_eq!(env_bool(key), None);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn env_bool_unset_returns_none() {
    assert_eq!(env_bool("__TEST_EB_SURELY_UNSET_PD_42__"), None);
}

#[test]
fn env_bool_whitespace_trimmed() {
    let key = "__TEST_EB_WS_551__";
    unsafe { std::env::set_var(key, "  true  ") };
    assert_eq!(env_bool(key), Some(true));
    unsafe { std::env::remove_var(key) };
}

// =============================================================================
// cookies
// =============================================================================

#[test]
fn session_cookie_is_http_only_lax() {
    let cookie = session_cookie("abc123".to_owned());
    assert_eq!(cookie.name(), "session_token");
    assert_eq!(cookie.value(), "abc123");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(cookie.path(), Some("/"));
}

#[test]
fn clear_cookie_expires_immediately() {
    let cookie = clear_session_cookie();
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
}

// COOKIE_SECURE and PUBLIC_BASE_URL are shared globals, so every scenario
// lives in one test to avoid races with parallel test threads.
#[test]
fn cookie_secure_env_override_and_base_url_inference() {
    unsafe { std::env::remove_var("COOKIE_SECURE") };

    // No override: inferred from the public base URL scheme.
    unsafe { std::env::set_var("PUBLIC_BASE_URL", "https://prepdesk.example.com") };
    assert!(cookie_secure());
    unsafe { std::env::set_var("PUBLIC_BASE_URL", "http://localhost:8080") };
    assert!(!cookie_secure());

    // Explicit override beats the inference either way.
    unsafe { std::env::set_var("COOKIE_SECURE", "true") };
    assert!(cookie_secure());
    unsafe { std::env::set_var("PUBLIC_BASE_URL", "https://prepdesk.example.com") };
    unsafe { std::env::set_var("COOKIE_SECURE", "false") };
    assert!(!cookie_secure());

    unsafe { std::env::remove_var("COOKIE_SECURE") };
    unsafe { std::env::remove_var("PUBLIC_BASE_URL") };
}
