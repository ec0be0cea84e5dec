//! Realtime change feed.
//!
//! Mutations publish a `ChangeEvent` into the `ChangeHub`; each WebSocket
//! connection holds a broadcast receiver and forwards the events its
//! scope is allowed to observe. Events carry the changed row snapshot,
//! but clients are expected to reload their lists on receipt — there is
//! no diff or merge protocol.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::access::Scope;
use crate::models::{Alert, AlertResponse};

/// Broadcast capacity. A lagging subscriber loses old events and is
/// expected to reload, so a modest buffer is enough.
const HUB_CAPACITY: usize = 256;

/// A change notification for the alert tables.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    AlertCreated { alert: Alert },
    AlertStatusChanged { alert: Alert },
    ResponseAdded { alert: Alert, response: AlertResponse },
}

impl ChangeEvent {
    /// The alert this event is about. Visibility is always decided
    /// against the alert row, including for appended responses.
    pub fn alert(&self) -> &Alert {
        match self {
            ChangeEvent::AlertCreated { alert } => alert,
            ChangeEvent::AlertStatusChanged { alert } => alert,
            ChangeEvent::ResponseAdded { alert, .. } => alert,
        }
    }

    /// Re-evaluate the row policy for a subscriber. A subscriber never
    /// observes an event the query API would hide.
    pub fn visible_to(&self, scope: &Scope) -> bool {
        scope.can_view_alert(self.alert())
    }
}

/// Fan-out point for change events.
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(HUB_CAPACITY);
        Self { tx }
    }

    /// Publish an event to all current subscribers. With no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.tx.receiver_count();
        if self.tx.send(event).is_err() {
            tracing::debug!("change event dropped: no subscribers");
        } else {
            tracing::debug!(receivers, "change event published");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertStatus, AlertType, ResponderKind};
    use chrono::Utc;
    use uuid::Uuid;

    fn alert_of(alert_type: AlertType) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            alert_type,
            status: AlertStatus::Pending,
            latitude: 0.0,
            longitude: 0.0,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let hub = ChangeHub::new();
        let mut rx = hub.subscribe();

        let alert = alert_of(AlertType::General);
        hub.publish(ChangeEvent::AlertCreated { alert: alert.clone() });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.alert().id, alert.id);
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let hub = ChangeHub::new();
        hub.publish(ChangeEvent::AlertCreated {
            alert: alert_of(AlertType::Police),
        });
    }

    #[test]
    fn medical_event_hidden_from_police_scope() {
        let event = ChangeEvent::AlertCreated {
            alert: alert_of(AlertType::Medical),
        };
        let police = Scope::Responder {
            kind: ResponderKind::Police,
            verified: true,
        };
        let hospital = Scope::Responder {
            kind: ResponderKind::Hospital,
            verified: true,
        };
        assert!(!event.visible_to(&police));
        assert!(event.visible_to(&hospital));
    }

    #[test]
    fn response_event_visibility_follows_the_alert() {
        let alert = alert_of(AlertType::Police);
        let event = ChangeEvent::ResponseAdded {
            alert: alert.clone(),
            response: AlertResponse {
                id: Uuid::new_v4(),
                alert_id: alert.id,
                responder_id: Uuid::new_v4(),
                action: "Dispatched unit 12".into(),
                created_at: Utc::now(),
            },
        };
        let owner = Scope::Civilian { user_id: alert.user_id };
        let stranger = Scope::Civilian { user_id: Uuid::new_v4() };
        assert!(event.visible_to(&owner));
        assert!(!event.visible_to(&stranger));
    }
}
