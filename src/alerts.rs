//! Alert lifecycle: creation, scoped listing, status progression,
//! and the append-only responder action log.
//!
//! Status moves forward only: pending → acknowledged → responding →
//! resolved. Re-asserting the current status is accepted as a no-op so
//! clients that re-send on reconnect stay idempotent; any backwards
//! move is rejected. An alert a scope cannot see behaves as if it does
//! not exist.

use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::access::Scope;
use crate::auth::Identity;
use crate::db::repository;
use crate::db::DatabaseError;
use crate::models::{Alert, AlertResponse, AlertStatus, AlertType, Contact};
use crate::realtime::{ChangeEvent, ChangeHub};

#[derive(Debug, thiserror::Error)]
pub enum AlertError {
    #[error("Alert not found")]
    NotFound,
    #[error("Only civilian accounts can raise alerts")]
    NotACivilian,
    #[error("Only verified responders can act on alerts")]
    NotAuthorized,
    #[error("Cannot move alert from {from} back to {to}")]
    BackwardsTransition { from: &'static str, to: &'static str },
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Input for raising an alert.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub alert_type: AlertType,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
}

/// Reporter data joined onto an alert for responders: who raised it,
/// how to reach them, and what a medic needs to know.
#[derive(Debug, Clone, Serialize)]
pub struct ReporterInfo {
    pub display_name: String,
    pub phone: String,
    pub medical_conditions: Vec<String>,
    pub blood_type: Option<String>,
    pub primary_contact: Option<Contact>,
}

/// An alert with its action log and, for responders, the reporter join.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDetail {
    pub alert: Alert,
    pub responses: Vec<AlertResponse>,
    pub reporter: Option<ReporterInfo>,
}

/// Raise a new alert. Civilian-only.
pub fn create_alert(
    conn: &Connection,
    hub: &ChangeHub,
    identity: &Identity,
    new: &NewAlert,
) -> Result<Alert, AlertError> {
    let user = match identity {
        Identity::Civilian(user) => user,
        Identity::Responder(_) => return Err(AlertError::NotACivilian),
    };

    let alert = Alert {
        id: Uuid::new_v4(),
        user_id: user.id,
        alert_type: new.alert_type,
        status: AlertStatus::Pending,
        latitude: new.latitude,
        longitude: new.longitude,
        description: new.description.clone(),
        created_at: Utc::now(),
    };
    repository::insert_alert(conn, &alert)?;

    tracing::info!(alert_id = %alert.id, alert_type = alert.alert_type.as_str(),
        "alert raised");
    hub.publish(ChangeEvent::AlertCreated { alert: alert.clone() });
    Ok(alert)
}

/// Alerts visible to the caller, most recent first.
pub fn list_alerts(conn: &Connection, scope: &Scope) -> Result<Vec<Alert>, AlertError> {
    let alerts = match scope.listable_types() {
        Some(types) => repository::list_alerts_by_types(conn, &types)?,
        None => match scope {
            Scope::Civilian { user_id } => repository::list_alerts_for_user(conn, user_id)?,
            Scope::Responder { .. } => unreachable!("responder scope always lists by type"),
        },
    };
    Ok(alerts)
}

/// Load an alert the caller may see, or behave as if it is absent.
fn load_visible_alert(
    conn: &Connection,
    scope: &Scope,
    alert_id: &Uuid,
) -> Result<Alert, AlertError> {
    let alert = repository::get_alert(conn, alert_id)?.ok_or(AlertError::NotFound)?;
    if !scope.can_view_alert(&alert) {
        return Err(AlertError::NotFound);
    }
    Ok(alert)
}

/// Alert detail with the action log and, for responders, the reporter join.
pub fn get_alert_detail(
    conn: &Connection,
    scope: &Scope,
    alert_id: &Uuid,
) -> Result<AlertDetail, AlertError> {
    let alert = load_visible_alert(conn, scope, alert_id)?;
    let responses = repository::list_responses_for_alert(conn, alert_id)?;

    let reporter = if scope.can_view_profile_of(&alert.user_id, Some(&alert))
        && matches!(scope, Scope::Responder { .. })
    {
        let user = repository::get_user(conn, &alert.user_id)?;
        let primary_contact = repository::get_primary_contact(conn, &alert.user_id)?;
        Some(ReporterInfo {
            display_name: user.display_name,
            phone: user.phone,
            medical_conditions: user.medical_conditions,
            blood_type: user.blood_type,
            primary_contact,
        })
    } else {
        None
    };

    Ok(AlertDetail {
        alert,
        responses,
        reporter,
    })
}

/// Advance an alert's status. Verified responders only; forward-only.
pub fn update_status(
    conn: &Connection,
    hub: &ChangeHub,
    identity: &Identity,
    alert_id: &Uuid,
    new_status: AlertStatus,
) -> Result<Alert, AlertError> {
    let scope = identity.scope();
    let mut alert = load_visible_alert(conn, &scope, alert_id)?;
    if !scope.can_act_on_alert(&alert) {
        return Err(AlertError::NotAuthorized);
    }

    if new_status == alert.status {
        return Ok(alert); // Idempotent re-assert
    }
    if new_status.rank() < alert.status.rank() {
        return Err(AlertError::BackwardsTransition {
            from: alert.status.as_str(),
            to: new_status.as_str(),
        });
    }

    repository::update_alert_status(conn, alert_id, new_status)?;
    alert.status = new_status;

    tracing::info!(alert_id = %alert.id, status = new_status.as_str(), "alert status advanced");
    hub.publish(ChangeEvent::AlertStatusChanged { alert: alert.clone() });
    Ok(alert)
}

/// Append a responder action to the alert's log.
pub fn add_response(
    conn: &Connection,
    hub: &ChangeHub,
    identity: &Identity,
    alert_id: &Uuid,
    action: &str,
) -> Result<AlertResponse, AlertError> {
    let responder = match identity {
        Identity::Responder(responder) => responder,
        Identity::Civilian(_) => return Err(AlertError::NotAuthorized),
    };
    let scope = identity.scope();
    let alert = load_visible_alert(conn, &scope, alert_id)?;
    if !scope.can_act_on_alert(&alert) {
        return Err(AlertError::NotAuthorized);
    }

    let response = AlertResponse {
        id: Uuid::new_v4(),
        alert_id: alert.id,
        responder_id: responder.id,
        action: action.to_string(),
        created_at: Utc::now(),
    };
    repository::insert_response(conn, &response)?;

    tracing::info!(alert_id = %alert.id, responder_id = %responder.id, "response logged");
    hub.publish(ChangeEvent::ResponseAdded {
        alert,
        response: response.clone(),
    });
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{signup_responder, signup_user, verify_responder, NewResponder, NewUser};
    use crate::db::open_memory_database;
    use crate::models::ResponderKind;

    fn civilian(conn: &mut Connection, email: &str) -> Identity {
        let (user, _) = signup_user(
            conn,
            &NewUser {
                email: email.to_string(),
                password: "long-enough-password".into(),
                display_name: "Ada".into(),
                phone: "555-0100".into(),
                medical_conditions: vec!["asthma".into()],
                blood_type: Some("O+".into()),
            },
        )
        .unwrap();
        Identity::Civilian(user)
    }

    fn responder(conn: &mut Connection, kind: ResponderKind, verified: bool) -> Identity {
        let (mut responder, _) = signup_responder(
            conn,
            &NewResponder {
                email: format!("{}@example.com", Uuid::new_v4()),
                password: "long-enough-password".into(),
                organization: "Central".into(),
                kind,
                jurisdiction: "Downtown".into(),
            },
        )
        .unwrap();
        if verified {
            verify_responder(conn, &responder.id).unwrap();
            responder.verified = true;
        }
        Identity::Responder(responder)
    }

    fn raise(conn: &Connection, hub: &ChangeHub, who: &Identity, t: AlertType) -> Alert {
        create_alert(
            conn,
            hub,
            who,
            &NewAlert {
                alert_type: t,
                latitude: 6.5244,
                longitude: 3.3792,
                description: Some("help".into()),
            },
        )
        .unwrap()
    }

    #[test]
    fn police_listing_filters_by_type() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        raise(&conn, &hub, &ada, AlertType::Police);
        raise(&conn, &hub, &ada, AlertType::Medical);
        raise(&conn, &hub, &ada, AlertType::General);

        let police = responder(&mut conn, ResponderKind::Police, true);
        let listed = list_alerts(&conn, &police.scope()).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed
            .iter()
            .all(|a| matches!(a.alert_type, AlertType::Police | AlertType::General)));
    }

    #[test]
    fn hospital_listing_filters_by_type() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        raise(&conn, &hub, &ada, AlertType::Police);
        raise(&conn, &hub, &ada, AlertType::Medical);

        let hospital = responder(&mut conn, ResponderKind::Hospital, true);
        let listed = list_alerts(&conn, &hospital.scope()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].alert_type, AlertType::Medical);
    }

    #[test]
    fn civilian_lists_only_own_alerts() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let ben = civilian(&mut conn, "ben@example.com");
        raise(&conn, &hub, &ada, AlertType::General);
        raise(&conn, &hub, &ben, AlertType::General);

        let listed = list_alerts(&conn, &ada.scope()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].user_id, ada.account_id());
    }

    #[test]
    fn responders_cannot_raise_alerts() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let police = responder(&mut conn, ResponderKind::Police, true);
        let err = create_alert(
            &conn,
            &hub,
            &police,
            &NewAlert {
                alert_type: AlertType::General,
                latitude: 0.0,
                longitude: 0.0,
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AlertError::NotACivilian));
    }

    #[test]
    fn status_advances_forward_and_rejects_regression() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::Police);
        let police = responder(&mut conn, ResponderKind::Police, true);

        let updated =
            update_status(&conn, &hub, &police, &alert.id, AlertStatus::Responding).unwrap();
        assert_eq!(updated.status, AlertStatus::Responding);

        let err = update_status(&conn, &hub, &police, &alert.id, AlertStatus::Pending).unwrap_err();
        assert!(matches!(err, AlertError::BackwardsTransition { .. }));

        // The stored row was untouched by the rejected write
        let detail = get_alert_detail(&conn, &police.scope(), &alert.id).unwrap();
        assert_eq!(detail.alert.status, AlertStatus::Responding);
    }

    #[test]
    fn reasserting_current_status_is_a_noop() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::General);
        let police = responder(&mut conn, ResponderKind::Police, true);

        update_status(&conn, &hub, &police, &alert.id, AlertStatus::Acknowledged).unwrap();
        let again =
            update_status(&conn, &hub, &police, &alert.id, AlertStatus::Acknowledged).unwrap();
        assert_eq!(again.status, AlertStatus::Acknowledged);
    }

    #[test]
    fn unverified_responder_cannot_update_status() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::General);
        let unverified = responder(&mut conn, ResponderKind::Police, false);

        let err = update_status(&conn, &hub, &unverified, &alert.id, AlertStatus::Acknowledged)
            .unwrap_err();
        assert!(matches!(err, AlertError::NotAuthorized));
    }

    #[test]
    fn invisible_alert_behaves_as_missing() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::Medical);
        let police = responder(&mut conn, ResponderKind::Police, true);

        let err = get_alert_detail(&conn, &police.scope(), &alert.id).unwrap_err();
        assert!(matches!(err, AlertError::NotFound));
        let err =
            update_status(&conn, &hub, &police, &alert.id, AlertStatus::Acknowledged).unwrap_err();
        assert!(matches!(err, AlertError::NotFound));
    }

    #[test]
    fn responder_detail_includes_reporter_and_primary_contact() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: ada.account_id(),
            name: "Grace".into(),
            relationship: "sister".into(),
            phone: "555-0111".into(),
            email: None,
            is_primary: true,
        };
        repository::insert_contact(&conn, &contact).unwrap();
        let alert = raise(&conn, &hub, &ada, AlertType::Medical);

        let hospital = responder(&mut conn, ResponderKind::Hospital, true);
        let detail = get_alert_detail(&conn, &hospital.scope(), &alert.id).unwrap();
        let reporter = detail.reporter.expect("responder detail carries reporter");
        assert_eq!(reporter.display_name, "Ada");
        assert_eq!(reporter.medical_conditions, vec!["asthma"]);
        assert_eq!(reporter.primary_contact.unwrap().name, "Grace");

        // The owner's own detail view has no reporter join
        let own = get_alert_detail(&conn, &ada.scope(), &alert.id).unwrap();
        assert!(own.reporter.is_none());
    }

    #[test]
    fn responses_append_and_surface_in_detail() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::Police);
        let police = responder(&mut conn, ResponderKind::Police, true);

        add_response(&conn, &hub, &police, &alert.id, "Dispatched unit 12").unwrap();
        add_response(&conn, &hub, &police, &alert.id, "Unit on scene").unwrap();

        let detail = get_alert_detail(&conn, &ada.scope(), &alert.id).unwrap();
        assert_eq!(detail.responses.len(), 2);
        assert_eq!(detail.responses[0].action, "Dispatched unit 12");
    }

    #[test]
    fn civilians_cannot_append_responses() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let ada = civilian(&mut conn, "ada@example.com");
        let alert = raise(&conn, &hub, &ada, AlertType::General);

        let err = add_response(&conn, &hub, &ada, &alert.id, "on my way").unwrap_err();
        assert!(matches!(err, AlertError::NotAuthorized));
    }

    #[tokio::test]
    async fn mutations_publish_scoped_change_events() {
        let mut conn = open_memory_database().unwrap();
        let hub = ChangeHub::new();
        let mut rx = hub.subscribe();
        let ada = civilian(&mut conn, "ada@example.com");

        let alert = raise(&conn, &hub, &ada, AlertType::Medical);
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ChangeEvent::AlertCreated { .. }));

        // Policy re-evaluated per event: hidden from police, visible to hospital
        let police_scope = crate::access::Scope::Responder {
            kind: ResponderKind::Police,
            verified: true,
        };
        assert!(!event.visible_to(&police_scope));

        let hospital = responder(&mut conn, ResponderKind::Hospital, true);
        update_status(&conn, &hub, &hospital, &alert.id, AlertStatus::Acknowledged).unwrap();
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ChangeEvent::AlertStatusChanged { .. }));
        assert_eq!(event.alert().status, AlertStatus::Acknowledged);
    }
}
