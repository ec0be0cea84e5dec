use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emergency contact for a civilian user.
/// At most one contact per user has `is_primary` set; the contact
/// service maintains the invariant inside a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub relationship: String,
    pub phone: String,
    pub email: Option<String>,
    pub is_primary: bool,
}
