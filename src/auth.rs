//! Accounts and sessions: signup, signin, signout, current-session lookup.
//!
//! Passwords are hashed with PBKDF2-SHA256. Session tokens carry 32 bytes
//! of entropy, travel as URL-safe base64, and are stored only as SHA-256
//! hex hashes. Signup inserts the identity row and the profile row in a
//! single transaction so a profile failure cannot orphan the identity.

use base64::Engine;
use chrono::Utc;
use pbkdf2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Pbkdf2,
};
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::access::Scope;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Account, AccountRole, Responder, ResponderKind, User};

const MIN_PASSWORD_LEN: usize = 8;

/// Auth failures, worded for direct display.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailTaken,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Session is invalid or has expired")]
    SessionInvalid,
    #[error("Password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// The authenticated caller: a civilian profile or a responder profile.
#[derive(Debug, Clone)]
pub enum Identity {
    Civilian(User),
    Responder(Responder),
}

impl Identity {
    pub fn account_id(&self) -> Uuid {
        match self {
            Identity::Civilian(user) => user.id,
            Identity::Responder(responder) => responder.id,
        }
    }

    /// Visibility scope for the access layer.
    pub fn scope(&self) -> Scope {
        match self {
            Identity::Civilian(user) => Scope::Civilian { user_id: user.id },
            Identity::Responder(responder) => Scope::Responder {
                kind: responder.kind,
                verified: responder.verified,
            },
        }
    }
}

/// Civilian signup input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub phone: String,
    pub medical_conditions: Vec<String>,
    pub blood_type: Option<String>,
}

/// Responder signup input. Accounts start unverified.
#[derive(Debug, Clone)]
pub struct NewResponder {
    pub email: String,
    pub password: String,
    pub organization: String,
    pub kind: ResponderKind,
    pub jurisdiction: String,
}

// ── Token helpers ────────────────────────────────────────────

/// Generate a random bearer token (URL-safe base64, 32 bytes of entropy).
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a bearer token. This is what the sessions table stores.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Pbkdf2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

fn check_password_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn map_insert_error(err: DatabaseError) -> AuthError {
    if err.is_unique_violation() {
        AuthError::EmailTaken
    } else {
        AuthError::Database(err)
    }
}

// ── Signup / signin / signout ────────────────────────────────

/// Create a civilian account, its profile, and a first session — one transaction.
pub fn signup_user(conn: &mut Connection, new: &NewUser) -> Result<(User, String), AuthError> {
    check_password_strength(&new.password)?;
    let password_hash = hash_password(&new.password)?;

    let account = Account {
        id: Uuid::new_v4(),
        email: new.email.trim().to_string(),
        password_hash,
        role: AccountRole::Civilian,
        created_at: Utc::now(),
    };
    let user = User {
        id: account.id,
        display_name: new.display_name.clone(),
        phone: new.phone.clone(),
        medical_conditions: new.medical_conditions.clone(),
        blood_type: new.blood_type.clone(),
        notification_token: None,
    };

    let token = generate_token();
    let token_hash = hash_token(&token);

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    repository::insert_account(&tx, &account).map_err(map_insert_error)?;
    repository::insert_user(&tx, &user)?;
    repository::insert_session(&tx, &token_hash, &account.id, Utc::now())?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(user_id = %user.id, "civilian account created");
    Ok((user, token))
}

/// Create a responder account (unverified), its profile, and a first session.
pub fn signup_responder(
    conn: &mut Connection,
    new: &NewResponder,
) -> Result<(Responder, String), AuthError> {
    check_password_strength(&new.password)?;
    let password_hash = hash_password(&new.password)?;

    let account = Account {
        id: Uuid::new_v4(),
        email: new.email.trim().to_string(),
        password_hash,
        role: AccountRole::Responder,
        created_at: Utc::now(),
    };
    let responder = Responder {
        id: account.id,
        organization: new.organization.clone(),
        kind: new.kind,
        jurisdiction: new.jurisdiction.clone(),
        verified: false,
        notification_token: None,
    };

    let token = generate_token();
    let token_hash = hash_token(&token);

    let tx = conn.transaction().map_err(DatabaseError::from)?;
    repository::insert_account(&tx, &account).map_err(map_insert_error)?;
    repository::insert_responder(&tx, &responder)?;
    repository::insert_session(&tx, &token_hash, &account.id, Utc::now())?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(responder_id = %responder.id, kind = responder.kind.as_str(),
        "responder account created (unverified)");
    Ok((responder, token))
}

/// Password sign-in. Returns the caller's identity and a fresh session token.
pub fn signin(conn: &Connection, email: &str, password: &str) -> Result<(Identity, String), AuthError> {
    let account = repository::find_account_by_email(conn, email.trim())?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash) {
        tracing::warn!(email = %account.email, "sign-in rejected: bad password");
        return Err(AuthError::InvalidCredentials);
    }

    let identity = load_identity(conn, &account)?;
    let token = generate_token();
    repository::insert_session(conn, &hash_token(&token), &account.id, Utc::now())?;
    Ok((identity, token))
}

/// Invalidate the session behind `token`. Idempotent.
pub fn signout(conn: &Connection, token: &str) -> Result<(), AuthError> {
    repository::delete_session(conn, &hash_token(token))?;
    Ok(())
}

/// Resolve a bearer token to the caller's identity.
pub fn authenticate(conn: &Connection, token: &str) -> Result<Identity, AuthError> {
    let account_id = repository::find_session_account(conn, &hash_token(token))?
        .ok_or(AuthError::SessionInvalid)?;
    let account = repository::get_account(conn, &account_id)?;
    load_identity(conn, &account)
}

/// Resolve an account id to its identity. Used by the WebSocket layer
/// after ticket consumption, where no bearer token is in hand.
pub fn identity_for_account(conn: &Connection, account_id: &Uuid) -> Result<Identity, AuthError> {
    let account = repository::get_account(conn, account_id)?;
    load_identity(conn, &account)
}

/// Flip a responder's verification flag (operator action, no UI modeled).
pub fn verify_responder(conn: &Connection, responder_id: &Uuid) -> Result<(), AuthError> {
    repository::set_responder_verified(conn, responder_id, true)?;
    tracing::info!(responder_id = %responder_id, "responder verified");
    Ok(())
}

fn load_identity(conn: &Connection, account: &Account) -> Result<Identity, AuthError> {
    match account.role {
        AccountRole::Civilian => Ok(Identity::Civilian(repository::get_user(conn, &account.id)?)),
        AccountRole::Responder => Ok(Identity::Responder(repository::get_responder(
            conn,
            &account.id,
        )?)),
    }
}
