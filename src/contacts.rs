//! Emergency contacts for civilian users.
//!
//! Invariant: at most one primary contact per user. The promote path
//! clears and sets inside one transaction (see
//! `repository::set_primary_contact`), so the invariant survives
//! failures between the two writes. Deleting the primary leaves the
//! user with zero primaries, which the invariant allows.

use rusqlite::Connection;
use uuid::Uuid;

use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::Contact;

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("Contact not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Input for creating or editing a contact.
#[derive(Debug, Clone)]
pub struct ContactInput {
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
    pub make_primary: bool,
}

pub fn list_contacts(conn: &Connection, user_id: &Uuid) -> Result<Vec<Contact>, ContactError> {
    Ok(repository::list_contacts_for_user(conn, user_id)?)
}

/// Add a contact; optionally promote it to primary in the same call.
pub fn add_contact(
    conn: &mut Connection,
    user_id: &Uuid,
    input: &ContactInput,
) -> Result<Contact, ContactError> {
    let contact = Contact {
        id: Uuid::new_v4(),
        user_id: *user_id,
        name: input.name.clone(),
        relationship: input.relationship.clone(),
        phone: input.phone.clone(),
        email: input.email.clone(),
        is_primary: false,
    };
    repository::insert_contact(conn, &contact)?;

    if input.make_primary {
        repository::set_primary_contact(conn, user_id, &contact.id)?;
        return Ok(Contact {
            is_primary: true,
            ..contact
        });
    }
    Ok(contact)
}

pub fn update_contact(
    conn: &mut Connection,
    user_id: &Uuid,
    contact_id: &Uuid,
    input: &ContactInput,
) -> Result<Contact, ContactError> {
    let existing = repository::get_contact(conn, contact_id)?
        .filter(|c| c.user_id == *user_id)
        .ok_or(ContactError::NotFound)?;

    let updated = Contact {
        name: input.name.clone(),
        relationship: input.relationship.clone(),
        phone: input.phone.clone(),
        email: input.email.clone(),
        ..existing
    };
    repository::update_contact(conn, &updated).map_err(not_found_or_db)?;

    if input.make_primary && !updated.is_primary {
        repository::set_primary_contact(conn, user_id, contact_id).map_err(not_found_or_db)?;
        return Ok(Contact {
            is_primary: true,
            ..updated
        });
    }
    Ok(updated)
}

pub fn delete_contact(
    conn: &Connection,
    user_id: &Uuid,
    contact_id: &Uuid,
) -> Result<(), ContactError> {
    repository::delete_contact(conn, user_id, contact_id).map_err(not_found_or_db)
}

/// Promote an existing contact to be the single primary.
pub fn set_primary(
    conn: &mut Connection,
    user_id: &Uuid,
    contact_id: &Uuid,
) -> Result<(), ContactError> {
    repository::set_primary_contact(conn, user_id, contact_id).map_err(not_found_or_db)
}

fn not_found_or_db(err: DatabaseError) -> ContactError {
    match err {
        DatabaseError::NotFound { .. } => ContactError::NotFound,
        other => ContactError::Database(other),
    }
}
