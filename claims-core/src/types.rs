use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const AIRBNB_DEADLINE_DAYS: i64 = 14;
pub const PROOF_DEADLINE_DAYS: i64 = 30;

/// Label used in messages when a report has no itemised damage.
pub const MULTIPLE_ITEMS: &str = "Multiple items";

/// Label used in messages when a report's reporter could not be loaded.
pub const UNKNOWN_REPORTER: &str = "Unknown reporter";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a SCREAMING_SNAKE_CASE string enum shared by the database, JSON and message text.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum!(Role, "role", {
    Cleaner => "CLEANER",
    ClaimTeam => "CLAIM_TEAM",
    Admin => "ADMIN",
});

string_enum!(ReportStatus, "report status", {
    Pending => "PENDING",
    InReview => "IN_REVIEW",
    SubmittedToAirbnb => "SUBMITTED_TO_AIRBNB",
    ProofRequired => "PROOF_REQUIRED",
    Approved => "APPROVED",
    Resolved => "RESOLVED",
    Cancelled => "CANCELLED",
});

string_enum!(NotificationType, "notification type", {
    NewDamageReport => "NEW_DAMAGE_REPORT",
    StatusUpdate => "STATUS_UPDATE",
    DeadlineReminder => "DEADLINE_REMINDER",
    ProofDeadlineReminder => "PROOF_DEADLINE_REMINDER",
});

/// Roles that receive new-report and deadline notifications.
pub const CLAIM_HANDLER_ROLES: &[Role] = &[Role::ClaimTeam, Role::Admin];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// A damage report as read from the report store, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: String,
    pub property_name: String,
    pub property_address: Option<String>,
    pub damage_type: Option<String>,
    pub description: Option<String>,
    pub damage_date: DateTime<Utc>,
    pub checkout_date: Option<DateTime<Utc>>,
    pub airbnb_deadline: Option<DateTime<Utc>>,
    pub proof_deadline: Option<DateTime<Utc>>,
    pub submitted_to_airbnb: bool,
    pub status: String,
    pub reporter: Option<User>,
    pub first_item_name: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("damage report {0} has no airbnb deadline")]
    MissingAirbnbDeadline(String),
    #[error("damage report {0} has no proof deadline")]
    MissingProofDeadline(String),
    #[error("damage report {0} violates proof deadline > airbnb deadline > damage date")]
    DeadlineOrder(String),
    #[error("damage report {id}: {source}")]
    Status {
        id: String,
        #[source]
        source: ParseEnumError,
    },
}

/// A validated damage report. Deadlines are fixed at creation and never recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageReport {
    pub id: String,
    pub property_name: String,
    pub property_address: Option<String>,
    pub damage_type: Option<String>,
    pub description: Option<String>,
    pub damage_date: DateTime<Utc>,
    pub checkout_date: Option<DateTime<Utc>>,
    pub airbnb_deadline: DateTime<Utc>,
    pub proof_deadline: DateTime<Utc>,
    pub submitted_to_airbnb: bool,
    pub status: ReportStatus,
    pub reporter: Option<User>,
    pub first_item_name: Option<String>,
}

impl DamageReport {
    pub fn item_label(&self) -> &str {
        self.first_item_name.as_deref().unwrap_or(MULTIPLE_ITEMS)
    }

    pub fn reporter_name(&self) -> &str {
        self.reporter.as_ref().map_or(UNKNOWN_REPORTER, |r| r.name.as_str())
    }
}

impl TryFrom<ReportRecord> for DamageReport {
    type Error = ReportError;

    fn try_from(record: ReportRecord) -> Result<Self, Self::Error> {
        let airbnb_deadline = record
            .airbnb_deadline
            .ok_or_else(|| ReportError::MissingAirbnbDeadline(record.id.clone()))?;
        let proof_deadline = record
            .proof_deadline
            .ok_or_else(|| ReportError::MissingProofDeadline(record.id.clone()))?;

        if !(proof_deadline > airbnb_deadline && airbnb_deadline > record.damage_date) {
            return Err(ReportError::DeadlineOrder(record.id));
        }

        let status = record.status.parse().map_err(|source| ReportError::Status {
            id: record.id.clone(),
            source,
        })?;

        Ok(DamageReport {
            id: record.id,
            property_name: record.property_name,
            property_address: record.property_address,
            damage_type: record.damage_type,
            description: record.description,
            damage_date: record.damage_date,
            checkout_date: record.checkout_date,
            airbnb_deadline,
            proof_deadline,
            submitted_to_airbnb: record.submitted_to_airbnb,
            status,
            reporter: record.reporter,
            first_item_name: record.first_item_name,
        })
    }
}

/// Airbnb submission and proof deadlines for a damage date.
pub fn deadlines_for(damage_date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        damage_date + Duration::days(AIRBNB_DEADLINE_DAYS),
        damage_date + Duration::days(PROOF_DEADLINE_DAYS),
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub damage_report_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: String,
    pub damage_report_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reporter() -> User {
        User {
            id: "user-1".to_string(),
            name: "Casey Cleaner".to_string(),
            email: "casey@example.com".to_string(),
            phone: None,
            role: Role::Cleaner,
            is_active: true,
        }
    }

    fn record(damage_date: DateTime<Utc>) -> ReportRecord {
        let (airbnb, proof) = deadlines_for(damage_date);
        ReportRecord {
            id: "report-1".to_string(),
            property_name: "Seaside Loft".to_string(),
            property_address: None,
            damage_type: None,
            description: None,
            damage_date,
            checkout_date: None,
            airbnb_deadline: Some(airbnb),
            proof_deadline: Some(proof),
            submitted_to_airbnb: false,
            status: "PENDING".to_string(),
            reporter: Some(reporter()),
            first_item_name: None,
        }
    }

    #[test]
    fn test_deadlines_for_damage_date() {
        let damage_date = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let (airbnb, proof) = deadlines_for(damage_date);
        assert_eq!(airbnb, Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap());
        assert_eq!(proof, Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_valid_record_converts() {
        let report = DamageReport::try_from(record(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())).unwrap();
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.item_label(), MULTIPLE_ITEMS);
        assert_eq!(report.reporter_name(), "Casey Cleaner");
    }

    #[test]
    fn test_missing_reporter_still_converts() {
        let mut rec = record(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        rec.reporter = None;
        let report = DamageReport::try_from(rec).unwrap();
        assert!(report.reporter.is_none());
        assert_eq!(report.reporter_name(), UNKNOWN_REPORTER);
    }

    #[test]
    fn test_missing_deadline_is_rejected() {
        let mut rec = record(Utc::now());
        rec.proof_deadline = None;
        assert_eq!(
            DamageReport::try_from(rec).unwrap_err(),
            ReportError::MissingProofDeadline("report-1".to_string())
        );
    }

    #[test]
    fn test_deadline_order_is_enforced() {
        let mut rec = record(Utc::now());
        rec.proof_deadline = rec.airbnb_deadline;
        assert!(matches!(
            DamageReport::try_from(rec),
            Err(ReportError::DeadlineOrder(_))
        ));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut rec = record(Utc::now());
        rec.status = "ARCHIVED".to_string();
        assert!(matches!(DamageReport::try_from(rec), Err(ReportError::Status { .. })));
    }

    #[test]
    fn test_enum_strings() {
        assert_eq!("PROOF_REQUIRED".parse::<ReportStatus>(), Ok(ReportStatus::ProofRequired));
        assert_eq!(NotificationType::DeadlineReminder.to_string(), "DEADLINE_REMINDER");
        assert_eq!(
            serde_json::to_string(&Role::ClaimTeam).unwrap(),
            "\"CLAIM_TEAM\""
        );
        assert!("claim_team".parse::<Role>().is_err());
    }
}
