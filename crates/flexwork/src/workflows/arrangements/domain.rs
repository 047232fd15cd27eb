use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for arrangement applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub u64);

/// Identifier wrapper for a single dated event inside an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// Identifier wrapper for staff members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StaffId(pub u64);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status reported by the arrangement backend.
///
/// Values outside the documented contract deserialize into `Unknown` so a
/// single odd record cannot reject a whole payload; the classifier routes
/// `Unknown` to neither output bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Withdrawn,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Unknown => "unknown",
        }
    }
}

/// Whether the application is a brand-new request or a change riding on an
/// already approved one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationState {
    NewApplication,
    ChangeRequest,
    #[serde(other)]
    Unknown,
}

impl ApplicationState {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationState::NewApplication => "new_application",
            ApplicationState::ChangeRequest => "change_request",
            ApplicationState::Unknown => "unknown",
        }
    }
}

/// Half-day granularity of a single arrangement event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationHour {
    Fullday,
    Am,
    Pm,
}

impl ApplicationHour {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationHour::Fullday => "fullday",
            ApplicationHour::Am => "am",
            ApplicationHour::Pm => "pm",
        }
    }
}

/// One concrete dated occurrence within an application. `requested_date`
/// carries no time component; serialization is strict `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangementEvent {
    pub event_id: EventId,
    pub requested_date: NaiveDate,
    pub location: String,
    pub application_hour: ApplicationHour,
}

/// A staff member's work-from-home application as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    pub staff_id: StaffId,
    pub status: ApplicationStatus,
    pub application_state: ApplicationState,
    pub recurring: bool,
    pub reason: String,
    pub created_on: DateTime<Utc>,
    pub last_updated_on: DateTime<Utc>,
    pub events: Vec<ArrangementEvent>,
}

impl Application {
    pub fn shape(&self) -> ApplicationShape {
        ApplicationShape::of(self)
    }

    pub fn status_view(&self) -> ApplicationStatusView {
        ApplicationStatusView {
            application_id: self.application_id,
            staff_id: self.staff_id,
            status: self.status.label(),
            application_state: self.application_state.label(),
            events: self.events.len(),
            last_updated_on: self.last_updated_on,
        }
    }
}

/// Shape of an application, derived from its event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationShape {
    Single,
    Multiple,
    Recurring,
}

impl ApplicationShape {
    /// Exactly one event is `Single`; otherwise the `recurring` flag decides
    /// between `Recurring` and `Multiple`.
    pub fn of(application: &Application) -> Self {
        if application.events.len() == 1 {
            ApplicationShape::Single
        } else if application.recurring {
            ApplicationShape::Recurring
        } else {
            ApplicationShape::Multiple
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationShape::Single => "Single",
            ApplicationShape::Multiple => "Multiple",
            ApplicationShape::Recurring => "Recurring",
        }
    }
}

/// Flattened per-event record produced by the classifier. Derived and
/// transient: recomputed on every pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedArrangement {
    pub application_id: ApplicationId,
    pub event_id: EventId,
    pub date: NaiveDate,
    pub hour: ApplicationHour,
    pub location: String,
    #[serde(rename = "application_type")]
    pub shape: ApplicationShape,
}

/// Sanitized application summary exposed over HTTP.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub staff_id: StaffId,
    pub status: &'static str,
    pub application_state: &'static str,
    pub events: usize,
    pub last_updated_on: DateTime<Utc>,
}

/// Directory record for one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub staff_id: StaffId,
    pub name: String,
    pub department: String,
    pub team: String,
    #[serde(default)]
    pub reporting_manager: Option<StaffId>,
}

/// Department node of the directory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentTeams {
    pub department: String,
    pub teams: Vec<TeamMembers>,
}

/// Team node of the directory hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMembers {
    pub team: String,
    pub members: Vec<StaffId>,
}

/// Error for calendar dates that do not parse as strict `YYYY-MM-DD`.
#[derive(Debug, thiserror::Error)]
#[error("failed to parse '{raw}' as YYYY-MM-DD")]
pub struct DateParseError {
    pub raw: String,
    #[source]
    source: chrono::ParseError,
}

/// Parse a calendar date from its explicit year/month/day components.
/// Locale- or timezone-sensitive parsing is deliberately not used.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|source| DateParseError {
        raw: raw.to_string(),
        source,
    })
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
