use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;

/// Persist a session. Only the SHA-256 hex hash of the token is stored.
pub fn insert_session(
    conn: &Connection,
    token_hash: &str,
    account_id: &Uuid,
    created_at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, account_id, created_at) VALUES (?1, ?2, ?3)",
        params![token_hash, account_id.to_string(), created_at],
    )?;
    Ok(())
}

pub fn find_session_account(
    conn: &Connection,
    token_hash: &str,
) -> Result<Option<Uuid>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT account_id FROM sessions WHERE token_hash = ?1",
            params![token_hash],
            |row| row.get::<_, String>(0),
        )
        .optional()?;

    row.map(|id| {
        Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
    })
    .transpose()
}

/// Sign-out. Returns true when a session was actually removed.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![token_hash],
    )?;
    Ok(changed > 0)
}
