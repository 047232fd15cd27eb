//! Work-from-home arrangement intake, classification, review, and presence
//! reporting.
//!
//! The classifier is a pure pass over in-memory data; the service wires it to
//! the store and directory boundaries and owns the request validation the
//! dashboard surfaces as alert banners.

pub mod classifier;
pub mod domain;
pub mod overview;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use classifier::{
    within_editable_window, ArrangementClassifier, ClassifiedArrangements, EDITABLE_WINDOW_DAYS,
};
pub use domain::{
    Application, ApplicationHour, ApplicationId, ApplicationShape, ApplicationState,
    ApplicationStatus, ApplicationStatusView, ArrangementEvent, ClassifiedArrangement,
    DepartmentTeams, Employee, EventId, StaffId, TeamMembers,
};
pub use overview::{presence_overview, PresenceOverview};
pub use repository::{
    ArrangementStore, DirectoryError, DirectoryProvider, StoreError, WithdrawCommand,
};
pub use router::arrangement_router;
pub use service::{
    ArrangementService, ArrangementServiceError, ArrangementSubmission, ChangeCommand, EventDraft,
    ProcessCommand, ReviewEntry, StaffArrangementsView, ValidationError, WithdrawRequest,
    WithdrawSelection,
};
