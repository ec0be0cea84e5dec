use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(AlertType {
    Police => "police",
    Medical => "medical",
    General => "general",
});

str_enum!(AlertStatus {
    Pending => "pending",
    Acknowledged => "acknowledged",
    Responding => "responding",
    Resolved => "resolved",
});

str_enum!(ResponderKind {
    Police => "police",
    Hospital => "hospital",
});

str_enum!(AccountRole {
    Civilian => "civilian",
    Responder => "responder",
});

impl AlertStatus {
    /// Position in the lifecycle. Transitions must never decrease this.
    pub fn rank(&self) -> u8 {
        match self {
            AlertStatus::Pending => 0,
            AlertStatus::Acknowledged => 1,
            AlertStatus::Responding => 2,
            AlertStatus::Resolved => 3,
        }
    }
}

impl ResponderKind {
    /// Alert types visible to a responder of this kind.
    pub fn visible_alert_types(&self) -> [AlertType; 2] {
        match self {
            ResponderKind::Police => [AlertType::Police, AlertType::General],
            ResponderKind::Hospital => [AlertType::Medical, AlertType::General],
        }
    }
}
