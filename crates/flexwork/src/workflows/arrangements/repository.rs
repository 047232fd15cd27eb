use serde::{Deserialize, Serialize};

use super::domain::{Application, ApplicationId, DepartmentTeams, Employee, EventId, StaffId};

/// Storage boundary standing in for the arrangement backend. One method per
/// backend operation the portal consumes, so implementations can be swapped
/// between the in-memory surrogate and a remote adapter.
pub trait ArrangementStore: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, StoreError>;
    fn update(&self, application: Application) -> Result<(), StoreError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError>;
    fn list_for_staff(&self, staff: &StaffId) -> Result<Vec<Application>, StoreError>;
    fn list_all(&self) -> Result<Vec<Application>, StoreError>;
    /// Withdraw one event of an application. Each call is independent; the
    /// service layer fans these out for multi-event withdrawals.
    fn withdraw_event(
        &self,
        application: &ApplicationId,
        event: &EventId,
        command: &WithdrawCommand,
    ) -> Result<(), StoreError>;
}

/// Read-only access to the employee directory consumed by the review queue
/// and the presence overview.
pub trait DirectoryProvider: Send + Sync {
    fn employee(&self, staff: &StaffId) -> Result<Option<Employee>, DirectoryError>;
    fn direct_reports(&self, manager: &StaffId) -> Result<Vec<Employee>, DirectoryError>;
    fn all_employees(&self) -> Result<Vec<Employee>, DirectoryError>;
    fn hierarchy(&self) -> Result<Vec<DepartmentTeams>, DirectoryError>;
}

/// Audit payload attached to a withdrawal, mirroring the backend wire body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawCommand {
    pub editor_id: StaffId,
    pub withdraw_reason: String,
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}
