use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AlertStatus, AlertType};

/// A civilian-submitted emergency report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub alert_type: AlertType,
    pub status: AlertStatus,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A logged responder action against an alert. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub id: Uuid,
    pub alert_id: Uuid,
    pub responder_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
}
