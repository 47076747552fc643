//! Session management and password digests.
//!
//! HTTP auth uses long-lived opaque session tokens stored server-side;
//! expiry is enforced in SQL so a stolen token dies with the row.
//! Passwords are stored as salted SHA-256 digests.

use std::fmt::Write;

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Generate a random 16-byte hex password salt.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Salted SHA-256 digest of a password, hex-encoded.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Constant-shape comparison of a candidate password against a stored digest.
#[must_use]
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    let candidate = hash_password(password, salt);
    // Both sides are fixed-length hex; byte-wise fold avoids short-circuit.
    candidate.len() == stored_hash.len()
        && candidate
            .bytes()
            .zip(stored_hash.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// User row returned from session validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
}

/// Login lookup result: the user plus its stored password digest.
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub user: SessionUser,
    pub password_hash: String,
    pub password_salt: String,
}

/// Look up a user by (lowercased) email for credential verification.
pub async fn find_login(pool: &PgPool, email: &str) -> Result<Option<LoginRecord>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT id, email, display_name, is_admin, password_hash, password_salt
          FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| LoginRecord {
        user: SessionUser {
            id: r.get("id"),
            email: r.get("email"),
            display_name: r.get("display_name"),
            is_admin: r.get("is_admin"),
        },
        password_hash: r.get("password_hash"),
        password_salt: r.get("password_salt"),
    }))
}

/// Create a session for the given user, returning the token.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate_token();
    sqlx::query("INSERT INTO sessions (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(token)
}

/// Validate a session token and return the associated user.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT u.id, u.email, u.display_name, u.is_admin
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| SessionUser {
        id: r.get("id"),
        email: r.get("email"),
        display_name: r.get("display_name"),
        is_admin: r.get("is_admin"),
    }))
}

/// Delete a session by token.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
