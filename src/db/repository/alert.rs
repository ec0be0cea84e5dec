use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Alert, AlertStatus, AlertType};

const ALERT_COLUMNS: &str =
    "id, user_id, alert_type, status, latitude, longitude, description, created_at";

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<(String, String, String, String, f64, f64, Option<String>, DateTime<Utc>)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn build_alert(
    (id, user_id, alert_type, status, latitude, longitude, description, created_at): (
        String,
        String,
        String,
        String,
        f64,
        f64,
        Option<String>,
        DateTime<Utc>,
    ),
) -> Result<Alert, DatabaseError> {
    Ok(Alert {
        id: Uuid::parse_str(&id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        user_id: Uuid::parse_str(&user_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        alert_type: AlertType::from_str(&alert_type)?,
        status: AlertStatus::from_str(&status)?,
        latitude,
        longitude,
        description,
        created_at,
    })
}

pub fn insert_alert(conn: &Connection, alert: &Alert) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO alerts (id, user_id, alert_type, status, latitude, longitude, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            alert.id.to_string(),
            alert.user_id.to_string(),
            alert.alert_type.as_str(),
            alert.status.as_str(),
            alert.latitude,
            alert.longitude,
            alert.description,
            alert.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_alert(conn: &Connection, id: &Uuid) -> Result<Option<Alert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"
    ))?;

    let row = stmt
        .query_row(params![id.to_string()], alert_from_row)
        .optional()?;
    row.map(build_alert).transpose()
}

/// Alerts of the given types, most recent first. Responder feeds.
pub fn list_alerts_by_types(
    conn: &Connection,
    types: &[AlertType],
) -> Result<Vec<Alert>, DatabaseError> {
    if types.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=types.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts
         WHERE alert_type IN ({placeholders})
         ORDER BY created_at DESC"
    ))?;

    let values = types.iter().map(|t| t.as_str()).collect::<Vec<_>>();
    let rows = stmt.query_map(rusqlite::params_from_iter(values), alert_from_row)?;

    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(build_alert(row?)?);
    }
    Ok(alerts)
}

/// A civilian's own alerts, most recent first.
pub fn list_alerts_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Alert>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ALERT_COLUMNS} FROM alerts
         WHERE user_id = ?1
         ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![user_id.to_string()], alert_from_row)?;

    let mut alerts = Vec::new();
    for row in rows {
        alerts.push(build_alert(row?)?);
    }
    Ok(alerts)
}

pub fn update_alert_status(
    conn: &Connection,
    id: &Uuid,
    status: AlertStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE alerts SET status = ?1 WHERE id = ?2",
        params![status.as_str(), id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "alert".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
