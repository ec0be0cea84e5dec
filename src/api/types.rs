//! Shared types for the API layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::geocode::Geocoder;
use crate::state::AppState;

/// One-time WebSocket ticket lifetime.
const WS_TICKET_TTL: Duration = Duration::from_secs(30);

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
    pub geocoder: Arc<Geocoder>,
    pub ws_tickets: Arc<Mutex<WsTicketStore>>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>, geocoder: Geocoder) -> Self {
        Self {
            state,
            geocoder: Arc::new(geocoder),
            ws_tickets: Arc::new(Mutex::new(WsTicketStore::new())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// WS ticket store — one-time WebSocket upgrade tokens
// ═══════════════════════════════════════════════════════════

/// One-time WebSocket upgrade ticket. Prevents session token exposure
/// in the upgrade query string.
struct WsTicket {
    account_id: Uuid,
    expires_at: Instant,
}

/// Store for one-time WebSocket upgrade tickets.
pub struct WsTicketStore {
    tickets: HashMap<String, WsTicket>,
}

impl WsTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: HashMap::new(),
        }
    }

    /// Issue a one-time ticket for the given account.
    pub fn issue(&mut self, account_id: Uuid) -> String {
        self.cleanup();
        let ticket = Uuid::new_v4().to_string();
        self.tickets.insert(
            ticket.clone(),
            WsTicket {
                account_id,
                expires_at: Instant::now() + WS_TICKET_TTL,
            },
        );
        ticket
    }

    /// Consume a ticket (one-time use). Returns the account id on success.
    pub fn consume(&mut self, ticket: &str) -> Option<Uuid> {
        let entry = self.tickets.remove(ticket)?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.account_id)
    }

    fn cleanup(&mut self) {
        let now = Instant::now();
        self.tickets.retain(|_, t| now < t.expires_at);
    }
}

impl Default for WsTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_issue_returns_unique() {
        let mut store = WsTicketStore::new();
        let t1 = store.issue(Uuid::new_v4());
        let t2 = store.issue(Uuid::new_v4());
        assert_ne!(t1, t2);
        assert!(!t1.is_empty());
    }

    #[test]
    fn ticket_consume_valid_once_only() {
        let mut store = WsTicketStore::new();
        let account = Uuid::new_v4();
        let ticket = store.issue(account);
        assert_eq!(store.consume(&ticket), Some(account));
        assert_eq!(store.consume(&ticket), None);
    }

    #[test]
    fn ticket_consume_invalid() {
        let mut store = WsTicketStore::new();
        assert_eq!(store.consume("nonexistent"), None);
    }

    #[test]
    fn ticket_consume_expired() {
        let mut store = WsTicketStore::new();
        store.tickets.insert(
            "expired-ticket".to_string(),
            WsTicket {
                account_id: Uuid::new_v4(),
                expires_at: Instant::now() - Duration::from_secs(1),
            },
        );
        assert_eq!(store.consume("expired-ticket"), None);
    }
}
