use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::domain::{
    Application, ApplicationShape, ApplicationState, ApplicationStatus, ClassifiedArrangement,
};

/// Number of calendar days, in either direction, an approved event stays
/// editable around the evaluation date. Both boundaries are inclusive.
pub const EDITABLE_WINDOW_DAYS: i64 = 14;

/// True when `date` falls inside the rolling editability window around
/// `today`. Day granularity only; a same-day event is inside the window by
/// plain calendar-date equality (distance zero).
pub fn within_editable_window(date: NaiveDate, today: NaiveDate) -> bool {
    (date - today).num_days().abs() <= EDITABLE_WINDOW_DAYS
}

/// Output of a classification pass over one staff member's applications.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ClassifiedArrangements {
    /// Events awaiting a decision, still editable by the requester.
    pub pending: Vec<ClassifiedArrangement>,
    /// Approved events inside the editability window.
    pub approved: Vec<ClassifiedArrangement>,
    /// Distinct month-of-year values present among pending events, sorted.
    /// Drives the month filter facet on the dashboard.
    pub pending_months: Vec<u32>,
}

/// Partitions applications into pending and approved-and-editable buckets.
///
/// Pure over in-memory data; the evaluation date is injected so callers and
/// tests control "now" explicitly.
#[derive(Debug, Clone, Copy)]
pub struct ArrangementClassifier {
    today: NaiveDate,
}

impl ArrangementClassifier {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn classify(&self, applications: &[Application]) -> ClassifiedArrangements {
        let mut pending = Vec::new();
        let mut approved = Vec::new();
        let mut months = BTreeSet::new();

        for application in applications {
            // Invariant says this cannot happen; skip rather than poison the pass.
            if application.events.is_empty() {
                continue;
            }

            let shape = ApplicationShape::of(application);

            match (application.status, application.application_state) {
                (
                    ApplicationStatus::Pending,
                    ApplicationState::NewApplication | ApplicationState::ChangeRequest,
                ) => {
                    for event in &application.events {
                        months.insert(event.requested_date.month());
                        pending.push(flatten(application, event, shape));
                    }
                }
                (
                    ApplicationStatus::Approved,
                    ApplicationState::NewApplication | ApplicationState::ChangeRequest,
                ) => {
                    for event in &application.events {
                        if within_editable_window(event.requested_date, self.today) {
                            approved.push(flatten(application, event, shape));
                        }
                    }
                }
                // Withdrawn, rejected, and unrecognized values land in neither bucket.
                _ => {}
            }
        }

        ClassifiedArrangements {
            pending,
            approved,
            pending_months: months.into_iter().collect(),
        }
    }
}

fn flatten(
    application: &Application,
    event: &super::domain::ArrangementEvent,
    shape: ApplicationShape,
) -> ClassifiedArrangement {
    ClassifiedArrangement {
        application_id: application.application_id,
        event_id: event.event_id,
        date: event.requested_date,
        hour: event.application_hour,
        location: event.location.clone(),
        shape,
    }
}
