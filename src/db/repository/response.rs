use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::AlertResponse;

pub fn insert_response(conn: &Connection, response: &AlertResponse) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO responses (id, alert_id, responder_id, action, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            response.id.to_string(),
            response.alert_id.to_string(),
            response.responder_id.to_string(),
            response.action,
            response.created_at,
        ],
    )?;
    Ok(())
}

/// Action log for an alert, oldest first (reads as a timeline).
pub fn list_responses_for_alert(
    conn: &Connection,
    alert_id: &Uuid,
) -> Result<Vec<AlertResponse>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, responder_id, action, created_at
         FROM responses WHERE alert_id = ?1
         ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map(params![alert_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, DateTime<Utc>>(3)?,
        ))
    })?;

    let mut responses = Vec::new();
    for row in rows {
        let (id, responder_id, action, created_at) = row?;
        responses.push(AlertResponse {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            alert_id: *alert_id,
            responder_id: Uuid::parse_str(&responder_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            action,
            created_at,
        });
    }
    Ok(responses)
}
