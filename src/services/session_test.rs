use super::*;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_empty() {
    assert_eq!(bytes_to_hex(&[]), "");
}

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token / generate_salt
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

#[test]
fn generate_salt_is_32_hex_chars() {
    let salt = generate_salt();
    assert_eq!(salt.len(), 32);
    assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
}

// =============================================================================
// password hashing
// =============================================================================

#[test]
fn hash_password_is_deterministic() {
    let a = hash_password("secret", "00ff");
    let b = hash_password("secret", "00ff");
    assert_eq!(a, b);
    assert_eq!(a.len(), 64);
}

#[test]
fn hash_password_depends_on_salt() {
    assert_ne!(hash_password("secret", "aa"), hash_password("secret", "bb"));
}

#[test]
fn verify_password_accepts_correct() {
    let salt = generate_salt();
    let hash = hash_password("hunter2", &salt);
    assert!(verify_password("hunter2", &salt, &hash));
}

#[test]
fn verify_password_rejects_wrong() {
    let salt = generate_salt();
    let hash = hash_password("hunter2", &salt);
    assert!(!verify_password("hunter3", &salt, &hash));
    assert!(!verify_password("hunter2", "0000", &hash));
}

#[test]
fn verify_password_rejects_truncated_hash() {
    let salt = generate_salt();
    let hash = hash_password("hunter2", &salt);
    assert!(!verify_password("hunter2", &salt, &hash[..32]));
}

// =============================================================================
// SessionUser
// =============================================================================

#[test]
fn session_user_serialize() {
    let user = SessionUser {
        id: Uuid::nil(),
        email: "asha@example.com".into(),
        display_name: "Asha".into(),
        is_admin: false,
    };
    let json = serde_json::to_value(&user).unwrap();
    assert_eq!(json["email"], "asha@example.com");
    assert_eq!(json["display_name"], "Asha");
    assert_eq!(json["is_admin"], false);
}
