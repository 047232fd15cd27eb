use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use flexwork::session::SessionContext;
use flexwork::workflows::arrangements::{
    Application, ApplicationId, ApplicationStatus, ArrangementStore, DepartmentTeams,
    DirectoryError, DirectoryProvider, Employee, EventId, StaffId, StoreError, TeamMembers,
    WithdrawCommand,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) sessions: Arc<SessionContext>,
    pub(crate) directory: Arc<InMemoryDirectory>,
}

/// Strict calendar-date parser for clap arguments.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    flexwork::workflows::arrangements::domain::parse_date(raw).map_err(|err| err.to_string())
}

/// In-memory stand-in for the arrangement backend, good for demos and tests.
#[derive(Default)]
pub(crate) struct InMemoryArrangementStore {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

impl InMemoryArrangementStore {
    pub(crate) fn with_applications(applications: Vec<Application>) -> Self {
        let store = Self::default();
        {
            let mut records = store.records.lock().expect("store mutex poisoned");
            for application in applications {
                records.insert(application.application_id, application);
            }
        }
        store
    }
}

impl ArrangementStore for InMemoryArrangementStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        if records.contains_key(&application.application_id) {
            return Err(StoreError::Conflict);
        }
        records.insert(application.application_id, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        if !records.contains_key(&application.application_id) {
            return Err(StoreError::NotFound);
        }
        records.insert(application.application_id, application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self
            .records
            .lock()
            .expect("store mutex poisoned")
            .get(id)
            .cloned())
    }

    fn list_for_staff(&self, staff: &StaffId) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|application| application.staff_id == *staff)
            .cloned()
            .collect();
        applications.sort_by_key(|application| application.application_id);
        Ok(applications)
    }

    fn list_all(&self) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .records
            .lock()
            .expect("store mutex poisoned")
            .values()
            .cloned()
            .collect();
        applications.sort_by_key(|application| application.application_id);
        Ok(applications)
    }

    fn withdraw_event(
        &self,
        application: &ApplicationId,
        event: &EventId,
        _command: &WithdrawCommand,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let record = records.get_mut(application).ok_or(StoreError::NotFound)?;
        let before = record.events.len();
        record
            .events
            .retain(|candidate| candidate.event_id != *event);
        if record.events.len() == before {
            return Err(StoreError::NotFound);
        }
        if record.events.is_empty() {
            record.status = ApplicationStatus::Withdrawn;
        }
        Ok(())
    }
}

/// In-memory employee directory mirroring the upstream HR hierarchy feed.
#[derive(Default)]
pub(crate) struct InMemoryDirectory {
    employees: HashMap<StaffId, Employee>,
}

impl InMemoryDirectory {
    pub(crate) fn with_employees(employees: Vec<Employee>) -> Self {
        Self {
            employees: employees
                .into_iter()
                .map(|employee| (employee.staff_id, employee))
                .collect(),
        }
    }
}

impl DirectoryProvider for InMemoryDirectory {
    fn employee(&self, staff: &StaffId) -> Result<Option<Employee>, DirectoryError> {
        Ok(self.employees.get(staff).cloned())
    }

    fn direct_reports(&self, manager: &StaffId) -> Result<Vec<Employee>, DirectoryError> {
        let mut reports: Vec<Employee> = self
            .employees
            .values()
            .filter(|employee| employee.reporting_manager == Some(*manager))
            .cloned()
            .collect();
        reports.sort_by_key(|employee| employee.staff_id);
        Ok(reports)
    }

    fn all_employees(&self) -> Result<Vec<Employee>, DirectoryError> {
        let mut employees: Vec<Employee> = self.employees.values().cloned().collect();
        employees.sort_by_key(|employee| employee.staff_id);
        Ok(employees)
    }

    fn hierarchy(&self) -> Result<Vec<DepartmentTeams>, DirectoryError> {
        let mut departments: BTreeMap<String, BTreeMap<String, Vec<StaffId>>> = BTreeMap::new();
        for employee in self.employees.values() {
            departments
                .entry(employee.department.clone())
                .or_default()
                .entry(employee.team.clone())
                .or_default()
                .push(employee.staff_id);
        }
        Ok(departments
            .into_iter()
            .map(|(department, teams)| DepartmentTeams {
                department,
                teams: teams
                    .into_iter()
                    .map(|(team, mut members)| {
                        members.sort();
                        TeamMembers { team, members }
                    })
                    .collect(),
            })
            .collect())
    }
}
