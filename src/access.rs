//! Row-visibility policy for alerts and the data joined to them.
//!
//! The rules mirror what a hosted backend would enforce with row-level
//! policies, evaluated here on every load and on every change event:
//! - police responders see alerts of type {police, general}
//! - hospital responders see alerts of type {medical, general}
//! - civilians see only alerts they created
//! - only verified responders may write status or append responses
//! - a responder may read the reporter's profile/contacts only through
//!   an alert that is visible to them
//!
//! Default-deny: anything not matched by a rule is refused.

use uuid::Uuid;

use crate::models::{Alert, AlertType, ResponderKind};

/// The caller's visibility scope, derived from their authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A civilian sees only their own rows.
    Civilian { user_id: Uuid },
    /// A responder sees alert types matching their kind.
    Responder { kind: ResponderKind, verified: bool },
}

impl Scope {
    /// Can this caller observe the given alert at all?
    pub fn can_view_alert(&self, alert: &Alert) -> bool {
        match self {
            Scope::Civilian { user_id } => alert.user_id == *user_id,
            Scope::Responder { kind, .. } => {
                kind.visible_alert_types().contains(&alert.alert_type)
            }
        }
    }

    /// Can this caller advance the alert's status or append a response?
    /// Verification gates writes; visibility is still required.
    pub fn can_act_on_alert(&self, alert: &Alert) -> bool {
        match self {
            Scope::Civilian { .. } => false,
            Scope::Responder { verified, .. } => *verified && self.can_view_alert(alert),
        }
    }

    /// Can this caller read the medical profile and contacts of `owner_id`?
    /// Civilians read their own; responders read through a visible alert.
    pub fn can_view_profile_of(&self, owner_id: &Uuid, via_alert: Option<&Alert>) -> bool {
        match self {
            Scope::Civilian { user_id } => user_id == owner_id,
            Scope::Responder { .. } => via_alert
                .map(|a| a.user_id == *owner_id && self.can_view_alert(a))
                .unwrap_or(false),
        }
    }

    /// Alert types this scope may list, `None` meaning "own rows, any type".
    pub fn listable_types(&self) -> Option<Vec<AlertType>> {
        match self {
            Scope::Civilian { .. } => None,
            Scope::Responder { kind, .. } => Some(kind.visible_alert_types().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertStatus;
    use chrono::Utc;

    fn alert_of(user_id: Uuid, alert_type: AlertType) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id,
            alert_type,
            status: AlertStatus::Pending,
            latitude: 0.0,
            longitude: 0.0,
            description: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn police_scope_sees_police_and_general_only() {
        let scope = Scope::Responder {
            kind: ResponderKind::Police,
            verified: true,
        };
        let owner = Uuid::new_v4();
        assert!(scope.can_view_alert(&alert_of(owner, AlertType::Police)));
        assert!(scope.can_view_alert(&alert_of(owner, AlertType::General)));
        assert!(!scope.can_view_alert(&alert_of(owner, AlertType::Medical)));
    }

    #[test]
    fn hospital_scope_sees_medical_and_general_only() {
        let scope = Scope::Responder {
            kind: ResponderKind::Hospital,
            verified: true,
        };
        let owner = Uuid::new_v4();
        assert!(scope.can_view_alert(&alert_of(owner, AlertType::Medical)));
        assert!(scope.can_view_alert(&alert_of(owner, AlertType::General)));
        assert!(!scope.can_view_alert(&alert_of(owner, AlertType::Police)));
    }

    #[test]
    fn civilian_sees_only_own_alerts() {
        let me = Uuid::new_v4();
        let scope = Scope::Civilian { user_id: me };
        assert!(scope.can_view_alert(&alert_of(me, AlertType::Police)));
        assert!(!scope.can_view_alert(&alert_of(Uuid::new_v4(), AlertType::Police)));
    }

    #[test]
    fn unverified_responder_cannot_act() {
        let owner = Uuid::new_v4();
        let alert = alert_of(owner, AlertType::General);
        let unverified = Scope::Responder {
            kind: ResponderKind::Police,
            verified: false,
        };
        let verified = Scope::Responder {
            kind: ResponderKind::Police,
            verified: true,
        };
        assert!(unverified.can_view_alert(&alert));
        assert!(!unverified.can_act_on_alert(&alert));
        assert!(verified.can_act_on_alert(&alert));
    }

    #[test]
    fn verified_responder_cannot_act_outside_visibility() {
        let scope = Scope::Responder {
            kind: ResponderKind::Hospital,
            verified: true,
        };
        assert!(!scope.can_act_on_alert(&alert_of(Uuid::new_v4(), AlertType::Police)));
    }

    #[test]
    fn civilians_never_act_on_alerts() {
        let me = Uuid::new_v4();
        let scope = Scope::Civilian { user_id: me };
        assert!(!scope.can_act_on_alert(&alert_of(me, AlertType::General)));
    }

    #[test]
    fn responder_reads_profile_only_through_visible_alert() {
        let owner = Uuid::new_v4();
        let scope = Scope::Responder {
            kind: ResponderKind::Police,
            verified: true,
        };
        let visible = alert_of(owner, AlertType::Police);
        let hidden = alert_of(owner, AlertType::Medical);

        assert!(scope.can_view_profile_of(&owner, Some(&visible)));
        assert!(!scope.can_view_profile_of(&owner, Some(&hidden)));
        assert!(!scope.can_view_profile_of(&owner, None));
        // An alert belonging to someone else grants nothing
        assert!(!scope.can_view_profile_of(&owner, Some(&alert_of(Uuid::new_v4(), AlertType::Police))));
    }

    #[test]
    fn civilian_reads_only_own_profile() {
        let me = Uuid::new_v4();
        let scope = Scope::Civilian { user_id: me };
        assert!(scope.can_view_profile_of(&me, None));
        assert!(!scope.can_view_profile_of(&Uuid::new_v4(), None));
    }
}
