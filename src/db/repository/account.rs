use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::{Account, AccountRole};

pub fn insert_account(conn: &Connection, account: &Account) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO accounts (id, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            account.id.to_string(),
            account.email,
            account.password_hash,
            account.role.as_str(),
            account.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_account_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Account>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password_hash, role, created_at
         FROM accounts WHERE email = ?1",
    )?;

    let row = stmt
        .query_row(params![email], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, DateTime<Utc>>(4)?,
            ))
        })
        .optional()?;

    row.map(|(id, email, password_hash, role, created_at)| {
        Ok(Account {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            email,
            password_hash,
            role: AccountRole::from_str(&role)?,
            created_at,
        })
    })
    .transpose()
}

pub fn get_account(conn: &Connection, id: &Uuid) -> Result<Account, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password_hash, role, created_at
         FROM accounts WHERE id = ?1",
    )?;

    let result = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, DateTime<Utc>>(4)?,
            ))
        })
        .optional()?;

    match result {
        Some((email, password_hash, role, created_at)) => Ok(Account {
            id: *id,
            email,
            password_hash,
            role: AccountRole::from_str(&role)?,
            created_at,
        }),
        None => Err(DatabaseError::NotFound {
            entity_type: "account".into(),
            id: id.to_string(),
        }),
    }
}
