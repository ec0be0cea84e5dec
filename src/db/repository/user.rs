use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::User;

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let conditions_json =
        serde_json::to_string(&user.medical_conditions).unwrap_or_else(|_| "[]".to_string());
    conn.execute(
        "INSERT INTO users (id, display_name, phone, medical_conditions, blood_type, notification_token)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user.id.to_string(),
            user.display_name,
            user.phone,
            conditions_json,
            user.blood_type,
            user.notification_token,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<User, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT display_name, phone, medical_conditions, blood_type, notification_token
         FROM users WHERE id = ?1",
    )?;

    let result = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .optional()?;

    match result {
        Some((display_name, phone, conditions_json, blood_type, notification_token)) => Ok(User {
            id: *id,
            display_name,
            phone,
            medical_conditions: serde_json::from_str(&conditions_json).unwrap_or_default(),
            blood_type,
            notification_token,
        }),
        None => Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        }),
    }
}

/// Profile edit: name, phone, medical conditions, blood type.
/// Notification tokens have their own update path.
pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let conditions_json =
        serde_json::to_string(&user.medical_conditions).unwrap_or_else(|_| "[]".to_string());
    let changed = conn.execute(
        "UPDATE users SET display_name = ?1, phone = ?2, medical_conditions = ?3, blood_type = ?4
         WHERE id = ?5",
        params![
            user.display_name,
            user.phone,
            conditions_json,
            user.blood_type,
            user.id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: user.id.to_string(),
        });
    }
    Ok(())
}

pub fn set_user_notification_token(
    conn: &Connection,
    id: &Uuid,
    token: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET notification_token = ?1 WHERE id = ?2",
        params![token, id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "user".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}
