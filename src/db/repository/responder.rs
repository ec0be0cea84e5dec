use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Responder, ResponderKind};

pub fn insert_responder(conn: &Connection, responder: &Responder) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO responders (id, organization, kind, jurisdiction, verified, notification_token)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            responder.id.to_string(),
            responder.organization,
            responder.kind.as_str(),
            responder.jurisdiction,
            responder.verified as i32,
            responder.notification_token,
        ],
    )?;
    Ok(())
}

pub fn get_responder(conn: &Connection, id: &Uuid) -> Result<Responder, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT organization, kind, jurisdiction, verified, notification_token
         FROM responders WHERE id = ?1",
    )?;

    let result = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .optional()?;

    match result {
        Some((organization, kind, jurisdiction, verified, notification_token)) => Ok(Responder {
            id: *id,
            organization,
            kind: ResponderKind::from_str(&kind)?,
            jurisdiction,
            verified: verified != 0,
            notification_token,
        }),
        None => Err(DatabaseError::NotFound {
            entity_type: "responder".into(),
            id: id.to_string(),
        }),
    }
}

/// Flip the verification flag. Verification gates status writes and
/// response appends in the access layer.
pub fn set_responder_verified(
    conn: &Connection,
    id: &Uuid,
    verified: bool,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE responders SET verified = ?1 WHERE id = ?2",
        params![verified as i32, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "responder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn set_responder_notification_token(
    conn: &Connection,
    id: &Uuid,
    token: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE responders SET notification_token = ?1 WHERE id = ?2",
        params![token, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "responder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
