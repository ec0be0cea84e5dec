use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Contact;

pub fn insert_contact(conn: &Connection, contact: &Contact) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO contacts (id, user_id, name, relationship, phone, email, is_primary)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            contact.id.to_string(),
            contact.user_id.to_string(),
            contact.name,
            contact.relationship,
            contact.phone,
            contact.email,
            contact.is_primary as i32,
        ],
    )?;
    Ok(())
}

pub fn get_contact(conn: &Connection, id: &Uuid) -> Result<Option<Contact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT user_id, name, relationship, phone, email, is_primary
         FROM contacts WHERE id = ?1",
    )?;

    let row = stmt
        .query_row(params![id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i32>(5)?,
            ))
        })
        .optional()?;

    row.map(|(user_id, name, relationship, phone, email, is_primary)| {
        Ok(Contact {
            id: *id,
            user_id: Uuid::parse_str(&user_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            name,
            relationship,
            phone,
            email,
            is_primary: is_primary != 0,
        })
    })
    .transpose()
}

/// Primary contact first, then by name.
pub fn list_contacts_for_user(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Vec<Contact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, relationship, phone, email, is_primary
         FROM contacts WHERE user_id = ?1
         ORDER BY is_primary DESC, name ASC",
    )?;

    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, i32>(5)?,
        ))
    })?;

    let mut contacts = Vec::new();
    for row in rows {
        let (id, name, relationship, phone, email, is_primary) = row?;
        contacts.push(Contact {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            user_id: *user_id,
            name,
            relationship,
            phone,
            email,
            is_primary: is_primary != 0,
        });
    }
    Ok(contacts)
}

pub fn get_primary_contact(
    conn: &Connection,
    user_id: &Uuid,
) -> Result<Option<Contact>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, relationship, phone, email
         FROM contacts WHERE user_id = ?1 AND is_primary = 1 LIMIT 1",
    )?;

    let row = stmt
        .query_row(params![user_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })
        .optional()?;

    row.map(|(id, name, relationship, phone, email)| {
        Ok(Contact {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            user_id: *user_id,
            name,
            relationship,
            phone,
            email,
            is_primary: true,
        })
    })
    .transpose()
}

pub fn update_contact(conn: &Connection, contact: &Contact) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE contacts SET name = ?1, relationship = ?2, phone = ?3, email = ?4
         WHERE id = ?5 AND user_id = ?6",
        params![
            contact.name,
            contact.relationship,
            contact.phone,
            contact.email,
            contact.id.to_string(),
            contact.user_id.to_string(),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "contact".into(),
            id: contact.id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_contact(
    conn: &Connection,
    user_id: &Uuid,
    contact_id: &Uuid,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM contacts WHERE id = ?1 AND user_id = ?2",
        params![contact_id.to_string(), user_id.to_string()],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "contact".into(),
            id: contact_id.to_string(),
        });
    }
    Ok(())
}

/// Make `contact_id` the single primary contact for `user_id`.
///
/// The clear and the set run in one transaction, so a failure between
/// them cannot leave the user with zero (or two) primary contacts.
pub fn set_primary_contact(
    conn: &mut Connection,
    user_id: &Uuid,
    contact_id: &Uuid,
) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;

    tx.execute(
        "UPDATE contacts SET is_primary = 0 WHERE user_id = ?1",
        params![user_id.to_string()],
    )?;
    let changed = tx.execute(
        "UPDATE contacts SET is_primary = 1 WHERE id = ?1 AND user_id = ?2",
        params![contact_id.to_string(), user_id.to_string()],
    )?;
    if changed == 0 {
        // Rolls back the clear on drop
        return Err(DatabaseError::NotFound {
            entity_type: "contact".into(),
            id: contact_id.to_string(),
        });
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::user::tests::seed_user;

    fn seed_contact(conn: &Connection, user_id: &Uuid, name: &str, primary: bool) -> Contact {
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: *user_id,
            name: name.to_string(),
            relationship: "sibling".to_string(),
            phone: "555-0101".to_string(),
            email: None,
            is_primary: primary,
        };
        insert_contact(conn, &contact).unwrap();
        contact
    }

    fn count_primaries(conn: &Connection, user_id: &Uuid) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM contacts WHERE user_id = ?1 AND is_primary = 1",
            params![user_id.to_string()],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn set_primary_leaves_exactly_one() {
        let mut conn = open_memory_database().unwrap();
        let user = seed_user(&conn, "Ada");
        let a = seed_contact(&conn, &user.id, "Alice", true);
        let b = seed_contact(&conn, &user.id, "Bob", false);

        set_primary_contact(&mut conn, &user.id, &b.id).unwrap();

        assert_eq!(count_primaries(&conn, &user.id), 1);
        let primary = get_primary_contact(&conn, &user.id).unwrap().unwrap();
        assert_eq!(primary.id, b.id);
        assert!(!get_contact(&conn, &a.id).unwrap().unwrap().is_primary);
    }

    #[test]
    fn set_primary_unknown_contact_rolls_back_clear() {
        let mut conn = open_memory_database().unwrap();
        let user = seed_user(&conn, "Ada");
        seed_contact(&conn, &user.id, "Alice", true);

        let err = set_primary_contact(&mut conn, &user.id, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        // The existing primary survived the failed transaction
        assert_eq!(count_primaries(&conn, &user.id), 1);
    }

    #[test]
    fn set_primary_does_not_cross_users() {
        let mut conn = open_memory_database().unwrap();
        let ada = seed_user(&conn, "Ada");
        let ben = seed_user(&conn, "Ben");
        let ada_contact = seed_contact(&conn, &ada.id, "Alice", true);
        let ben_contact = seed_contact(&conn, &ben.id, "Bill", true);

        // Ada cannot claim Ben's contact as her primary
        let err = set_primary_contact(&mut conn, &ada.id, &ben_contact.id).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
        assert!(get_contact(&conn, &ada_contact.id).unwrap().unwrap().is_primary);
        assert!(get_contact(&conn, &ben_contact.id).unwrap().unwrap().is_primary);
    }

    #[test]
    fn list_orders_primary_first() {
        let conn = open_memory_database().unwrap();
        let user = seed_user(&conn, "Ada");
        seed_contact(&conn, &user.id, "Zoe", true);
        seed_contact(&conn, &user.id, "Alice", false);

        let contacts = list_contacts_for_user(&conn, &user.id).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Zoe");
        assert!(contacts[0].is_primary);
    }

    #[test]
    fn delete_requires_owning_user() {
        let conn = open_memory_database().unwrap();
        let ada = seed_user(&conn, "Ada");
        let ben = seed_user(&conn, "Ben");
        let contact = seed_contact(&conn, &ada.id, "Alice", false);

        assert!(delete_contact(&conn, &ben.id, &contact.id).is_err());
        assert!(delete_contact(&conn, &ada.id, &contact.id).is_ok());
    }
}
