use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::classifier::{within_editable_window, ArrangementClassifier, ClassifiedArrangements};
use super::domain::{
    deserialize_date, Application, ApplicationHour, ApplicationId, ApplicationState,
    ApplicationStatus, ArrangementEvent, Employee, EventId, StaffId,
};
use super::repository::{
    ArrangementStore, DirectoryError, DirectoryProvider, StoreError, WithdrawCommand,
};

/// Service composing the store, the directory, and the window classifier.
pub struct ArrangementService<S, D> {
    store: Arc<S>,
    directory: Arc<D>,
}

static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_application_id() -> ApplicationId {
    ApplicationId(APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

fn next_event_id() -> EventId {
    EventId(EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Inbound payload for a brand-new arrangement request.
#[derive(Debug, Clone, Deserialize)]
pub struct ArrangementSubmission {
    pub staff_id: StaffId,
    pub reason: String,
    #[serde(default)]
    pub recurring: bool,
    pub events: Vec<EventDraft>,
}

/// One requested date inside a submission or change request.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    #[serde(deserialize_with = "deserialize_date")]
    pub requested_date: NaiveDate,
    pub location: String,
    pub application_hour: ApplicationHour,
}

/// Inbound payload turning an approved application into a change request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeCommand {
    pub editor_id: StaffId,
    pub reason: String,
    pub events: Vec<EventDraft>,
}

/// Wire body of a single-event withdrawal
/// (`PUT /application/withdraw/{applicationId}/{eventId}`).
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawRequest {
    pub status: ApplicationStatus,
    pub editor_id: StaffId,
    pub withdraw_reason: String,
}

/// A multi-event withdrawal selection made on the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawSelection {
    pub event_ids: Vec<EventId>,
    pub editor_id: StaffId,
    pub withdraw_reason: String,
}

/// Wire body of an approve/reject decision
/// (`PUT /application/process/{applicationId}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessCommand {
    pub status: ApplicationStatus,
    pub approver_id: StaffId,
    pub application_id: ApplicationId,
    pub outcome_reason: String,
}

/// Classified dashboard data for one staff member.
#[derive(Debug, Clone, Serialize)]
pub struct StaffArrangementsView {
    pub staff_id: StaffId,
    pub today: NaiveDate,
    pub arrangements: ClassifiedArrangements,
}

/// One pending application in a manager's review queue.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub requester: Employee,
    pub application: Application,
}

/// Request-shape problems surfaced to the user as alert conditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("reason must not be empty")]
    EmptyReason,
    #[error("at least one requested date is required")]
    NoEvents,
    #[error("no events selected for withdrawal")]
    EmptySelection,
    #[error("withdrawal body must carry status 'withdrawn', got '{0}'")]
    InvalidWithdrawStatus(&'static str),
    #[error("decision must be 'approved' or 'rejected', got '{0}'")]
    InvalidDecision(&'static str),
    #[error("payload names application {found}, path names {expected}")]
    MismatchedApplication {
        expected: ApplicationId,
        found: ApplicationId,
    },
}

/// Error raised by the arrangement service.
#[derive(Debug, thiserror::Error)]
pub enum ArrangementServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("staff member {0} is not in the directory")]
    UnknownStaff(StaffId),
    #[error("application {0} not found")]
    UnknownApplication(ApplicationId),
    #[error("event {event} does not belong to application {application}")]
    UnknownEvent {
        application: ApplicationId,
        event: EventId,
    },
    #[error("application {0} is not awaiting a decision")]
    NotPending(ApplicationId),
    #[error("application {0} is not approved")]
    NotApproved(ApplicationId),
    #[error("application {application} with status '{status}' cannot be modified")]
    NotEditable {
        application: ApplicationId,
        status: &'static str,
    },
    #[error("event {event} on {date} is outside the editability window")]
    OutsideEditableWindow { event: EventId, date: NaiveDate },
    #[error("application {0} has no events left inside the editability window")]
    WindowClosed(ApplicationId),
}

impl<S, D> ArrangementService<S, D>
where
    S: ArrangementStore + 'static,
    D: DirectoryProvider + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self { store, directory }
    }

    /// Submit a new application. It enters the queue as
    /// `pending` / `new_application`.
    pub fn submit(
        &self,
        submission: ArrangementSubmission,
    ) -> Result<Application, ArrangementServiceError> {
        let reason = validated_reason(&submission.reason)?;
        if submission.events.is_empty() {
            return Err(ValidationError::NoEvents.into());
        }
        let requester = self.known_staff(&submission.staff_id)?;

        let now = Utc::now();
        let application = Application {
            application_id: next_application_id(),
            staff_id: requester.staff_id,
            status: ApplicationStatus::Pending,
            application_state: ApplicationState::NewApplication,
            recurring: submission.recurring,
            reason,
            created_on: now,
            last_updated_on: now,
            events: submission.events.into_iter().map(materialize_event).collect(),
        };

        let stored = self.store.insert(application)?;
        info!(
            application_id = %stored.application_id,
            staff_id = %stored.staff_id,
            events = stored.events.len(),
            "arrangement submitted"
        );
        Ok(stored)
    }

    /// Replace an approved application's events with a pending change
    /// request. Only allowed while the editability window still covers at
    /// least one of its current events.
    pub fn request_change(
        &self,
        application_id: &ApplicationId,
        change: ChangeCommand,
        today: NaiveDate,
    ) -> Result<Application, ArrangementServiceError> {
        let reason = validated_reason(&change.reason)?;
        if change.events.is_empty() {
            return Err(ValidationError::NoEvents.into());
        }
        self.known_staff(&change.editor_id)?;

        let mut application = self.known_application(application_id)?;
        if application.status != ApplicationStatus::Approved {
            return Err(ArrangementServiceError::NotApproved(*application_id));
        }
        if !application
            .events
            .iter()
            .any(|event| within_editable_window(event.requested_date, today))
        {
            return Err(ArrangementServiceError::WindowClosed(*application_id));
        }

        application.status = ApplicationStatus::Pending;
        application.application_state = ApplicationState::ChangeRequest;
        application.reason = reason;
        application.events = change.events.into_iter().map(materialize_event).collect();
        application.last_updated_on = Utc::now();

        self.store.update(application.clone())?;
        info!(
            application_id = %application.application_id,
            editor_id = %change.editor_id,
            "change request recorded"
        );
        Ok(application)
    }

    /// Withdraw one event, mirroring the backend's per-event endpoint.
    pub fn withdraw_event(
        &self,
        application_id: &ApplicationId,
        event_id: &EventId,
        request: WithdrawRequest,
        today: NaiveDate,
    ) -> Result<(), ArrangementServiceError> {
        if request.status != ApplicationStatus::Withdrawn {
            return Err(ValidationError::InvalidWithdrawStatus(request.status.label()).into());
        }
        let withdraw_reason = validated_reason(&request.withdraw_reason)?;

        let application = self.known_application(application_id)?;
        self.guard_editable(&application, &[*event_id], today)?;

        let command = WithdrawCommand {
            editor_id: request.editor_id,
            withdraw_reason,
        };
        self.store.withdraw_event(application_id, event_id, &command)?;
        info!(
            application_id = %application_id,
            event_id = %event_id,
            editor_id = %command.editor_id,
            "event withdrawn"
        );
        Ok(())
    }

    /// Withdraw a dashboard selection: one store call per event, fanned out
    /// concurrently, then awaited as a set. Any failing call fails the whole
    /// operation; calls that already completed are not rolled back, so the
    /// caller re-fetches or retries to converge.
    pub async fn withdraw_selection(
        &self,
        application_id: &ApplicationId,
        selection: WithdrawSelection,
        today: NaiveDate,
    ) -> Result<usize, ArrangementServiceError> {
        if selection.event_ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }
        let withdraw_reason = validated_reason(&selection.withdraw_reason)?;

        let application = self.known_application(application_id)?;
        self.guard_editable(&application, &selection.event_ids, today)?;

        let calls = selection.event_ids.iter().map(|event_id| {
            let command = WithdrawCommand {
                editor_id: selection.editor_id,
                withdraw_reason: withdraw_reason.clone(),
            };
            let event_id = *event_id;
            async move { self.store.withdraw_event(application_id, &event_id, &command) }
        });

        let results = join_all(calls).await;
        let requested = results.len();
        results
            .into_iter()
            .collect::<Result<(), StoreError>>()?;

        info!(
            application_id = %application_id,
            editor_id = %selection.editor_id,
            events = requested,
            "selection withdrawn"
        );
        Ok(requested)
    }

    /// Approve or reject a pending application.
    pub fn process(
        &self,
        application_id: &ApplicationId,
        command: ProcessCommand,
    ) -> Result<Application, ArrangementServiceError> {
        if command.application_id != *application_id {
            return Err(ValidationError::MismatchedApplication {
                expected: *application_id,
                found: command.application_id,
            }
            .into());
        }
        if !matches!(
            command.status,
            ApplicationStatus::Approved | ApplicationStatus::Rejected
        ) {
            return Err(ValidationError::InvalidDecision(command.status.label()).into());
        }
        validated_reason(&command.outcome_reason)?;
        self.known_staff(&command.approver_id)?;

        let mut application = self.known_application(application_id)?;
        if application.status != ApplicationStatus::Pending {
            return Err(ArrangementServiceError::NotPending(*application_id));
        }

        application.status = command.status;
        application.last_updated_on = Utc::now();
        self.store.update(application.clone())?;

        info!(
            application_id = %application_id,
            approver_id = %command.approver_id,
            decision = command.status.label(),
            "application processed"
        );
        Ok(application)
    }

    /// Classified dashboard for one staff member.
    pub fn staff_dashboard(
        &self,
        staff_id: &StaffId,
        today: NaiveDate,
    ) -> Result<StaffArrangementsView, ArrangementServiceError> {
        let requester = self.known_staff(staff_id)?;
        let applications = self.store.list_for_staff(&requester.staff_id)?;
        let arrangements = ArrangementClassifier::new(today).classify(&applications);
        Ok(StaffArrangementsView {
            staff_id: requester.staff_id,
            today,
            arrangements,
        })
    }

    /// Pending applications across a manager's direct reports, oldest first.
    pub fn review_queue(
        &self,
        approver_id: &StaffId,
    ) -> Result<Vec<ReviewEntry>, ArrangementServiceError> {
        self.known_staff(approver_id)?;
        let mut queue = Vec::new();
        for report in self.directory.direct_reports(approver_id)? {
            for application in self.store.list_for_staff(&report.staff_id)? {
                if application.status == ApplicationStatus::Pending {
                    queue.push(ReviewEntry {
                        requester: report.clone(),
                        application,
                    });
                }
            }
        }
        queue.sort_by_key(|entry| entry.application.created_on);
        Ok(queue)
    }

    /// Fetch one application for detail views.
    pub fn application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ArrangementServiceError> {
        self.known_application(application_id)
    }

    /// Office/home presence for one day across the whole directory.
    pub fn overview(
        &self,
        date: NaiveDate,
    ) -> Result<super::overview::PresenceOverview, ArrangementServiceError> {
        let employees = self.directory.all_employees()?;
        let applications = self.store.list_all()?;
        Ok(super::overview::presence_overview(
            date,
            &employees,
            &applications,
        ))
    }

    /// Department → team → members view of the directory.
    pub fn hierarchy(
        &self,
    ) -> Result<Vec<super::domain::DepartmentTeams>, ArrangementServiceError> {
        Ok(self.directory.hierarchy()?)
    }

    /// Directory lookup for one staff member.
    pub fn employee(&self, staff_id: &StaffId) -> Result<Employee, ArrangementServiceError> {
        self.known_staff(staff_id)
    }

    fn known_staff(&self, staff_id: &StaffId) -> Result<Employee, ArrangementServiceError> {
        self.directory
            .employee(staff_id)?
            .ok_or(ArrangementServiceError::UnknownStaff(*staff_id))
    }

    fn known_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Application, ArrangementServiceError> {
        self.store
            .fetch(application_id)?
            .ok_or(ArrangementServiceError::UnknownApplication(*application_id))
    }

    /// Pending events are always editable; approved ones only inside the
    /// window. Anything else on the application is off limits.
    fn guard_editable(
        &self,
        application: &Application,
        event_ids: &[EventId],
        today: NaiveDate,
    ) -> Result<(), ArrangementServiceError> {
        match application.status {
            ApplicationStatus::Pending => Ok(()),
            ApplicationStatus::Approved => {
                for event_id in event_ids {
                    let event = application
                        .events
                        .iter()
                        .find(|event| event.event_id == *event_id)
                        .ok_or(ArrangementServiceError::UnknownEvent {
                            application: application.application_id,
                            event: *event_id,
                        })?;
                    if !within_editable_window(event.requested_date, today) {
                        return Err(ArrangementServiceError::OutsideEditableWindow {
                            event: event.event_id,
                            date: event.requested_date,
                        });
                    }
                }
                Ok(())
            }
            other => Err(ArrangementServiceError::NotEditable {
                application: application.application_id,
                status: other.label(),
            }),
        }
    }
}

fn validated_reason(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyReason);
    }
    Ok(trimmed.to_string())
}

fn materialize_event(draft: EventDraft) -> ArrangementEvent {
    ArrangementEvent {
        event_id: next_event_id(),
        requested_date: draft.requested_date,
        location: draft.location,
        application_hour: draft.application_hour,
    }
}
