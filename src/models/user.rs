use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AccountRole, ResponderKind};

/// Login identity shared by civilians and responders.
/// The password hash never leaves the auth layer.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

/// Civilian profile. Created at signup, mutated by profile edits,
/// never deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub phone: String,
    pub medical_conditions: Vec<String>,
    pub blood_type: Option<String>,
    pub notification_token: Option<String>,
}

/// Responder profile. `verified` gates status writes and response appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Responder {
    pub id: Uuid,
    pub organization: String,
    pub kind: ResponderKind,
    pub jurisdiction: String,
    pub verified: bool,
    pub notification_token: Option<String>,
}
