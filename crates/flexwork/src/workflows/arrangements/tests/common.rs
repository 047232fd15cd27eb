use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::workflows::arrangements::domain::{
    Application, ApplicationHour, ApplicationId, ApplicationState, ApplicationStatus,
    ArrangementEvent, DepartmentTeams, Employee, EventId, StaffId, TeamMembers,
};
use crate::workflows::arrangements::repository::{
    ArrangementStore, DirectoryError, DirectoryProvider, StoreError, WithdrawCommand,
};
use crate::workflows::arrangements::service::ArrangementService;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn submitted_at(offset_minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).single().expect("valid timestamp")
        + Duration::minutes(offset_minutes)
}

pub(super) fn event(id: u64, requested: NaiveDate, hour: ApplicationHour) -> ArrangementEvent {
    ArrangementEvent {
        event_id: EventId(id),
        requested_date: requested,
        location: "home".to_string(),
        application_hour: hour,
    }
}

pub(super) fn application(
    id: u64,
    staff: u64,
    status: ApplicationStatus,
    state: ApplicationState,
    recurring: bool,
    events: Vec<ArrangementEvent>,
) -> Application {
    Application {
        application_id: ApplicationId(id),
        staff_id: StaffId(staff),
        status,
        application_state: state,
        recurring,
        reason: "childcare on site days".to_string(),
        created_on: submitted_at(id as i64 % 600),
        last_updated_on: submitted_at(id as i64 % 600),
        events,
    }
}

pub(super) fn employee(
    staff: u64,
    name: &str,
    department: &str,
    team: &str,
    manager: Option<u64>,
) -> Employee {
    Employee {
        staff_id: StaffId(staff),
        name: name.to_string(),
        department: department.to_string(),
        team: team.to_string(),
        reporting_manager: manager.map(StaffId),
    }
}

/// Manager 1000 leads Platform; 2000 leads Payroll; everyone else reports in.
pub(super) fn sample_directory() -> Vec<Employee> {
    vec![
        employee(1000, "Rachel Ong", "Engineering", "Platform", None),
        employee(1001, "Devi Nair", "Engineering", "Platform", Some(1000)),
        employee(1002, "Marcus Teo", "Engineering", "Platform", Some(1000)),
        employee(2000, "Priya Menon", "Finance", "Payroll", None),
        employee(2001, "Jonas Lim", "Finance", "Payroll", Some(2000)),
    ]
}

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<ApplicationId, Application>>,
    withdrawals: Mutex<Vec<(ApplicationId, EventId, WithdrawCommand)>>,
    failing_event: Mutex<Option<EventId>>,
}

impl MemoryStore {
    pub(super) fn with_applications(applications: Vec<Application>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut records = store.records.lock().expect("lock");
            for application in applications {
                records.insert(application.application_id, application);
            }
        }
        Arc::new(store)
    }

    /// Force `withdraw_event` to fail for one event id, simulating a lost
    /// call in the fan-out.
    pub(super) fn fail_withdrawals_of(&self, event: EventId) {
        *self.failing_event.lock().expect("lock") = Some(event);
    }

    pub(super) fn withdrawals(&self) -> Vec<(ApplicationId, EventId, WithdrawCommand)> {
        self.withdrawals.lock().expect("lock").clone()
    }
}

impl ArrangementStore for MemoryStore {
    fn insert(&self, application: Application) -> Result<Application, StoreError> {
        let mut records = self.records.lock().expect("lock");
        if records.contains_key(&application.application_id) {
            return Err(StoreError::Conflict);
        }
        records.insert(application.application_id, application.clone());
        Ok(application)
    }

    fn update(&self, application: Application) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("lock");
        if !records.contains_key(&application.application_id) {
            return Err(StoreError::NotFound);
        }
        records.insert(application.application_id, application);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, StoreError> {
        Ok(self.records.lock().expect("lock").get(id).cloned())
    }

    fn list_for_staff(&self, staff: &StaffId) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> = self
            .records
            .lock()
            .expect("lock")
            .values()
            .filter(|application| application.staff_id == *staff)
            .cloned()
            .collect();
        applications.sort_by_key(|application| application.application_id);
        Ok(applications)
    }

    fn list_all(&self) -> Result<Vec<Application>, StoreError> {
        let mut applications: Vec<Application> =
            self.records.lock().expect("lock").values().cloned().collect();
        applications.sort_by_key(|application| application.application_id);
        Ok(applications)
    }

    fn withdraw_event(
        &self,
        application: &ApplicationId,
        event: &EventId,
        command: &WithdrawCommand,
    ) -> Result<(), StoreError> {
        if *self.failing_event.lock().expect("lock") == Some(*event) {
            return Err(StoreError::Unavailable("injected withdraw failure".to_string()));
        }

        let mut records = self.records.lock().expect("lock");
        let record = records.get_mut(application).ok_or(StoreError::NotFound)?;
        let before = record.events.len();
        record.events.retain(|candidate| candidate.event_id != *event);
        if record.events.len() == before {
            return Err(StoreError::NotFound);
        }
        if record.events.is_empty() {
            record.status = ApplicationStatus::Withdrawn;
        }

        self.withdrawals
            .lock()
            .expect("lock")
            .push((*application, *event, command.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    employees: HashMap<StaffId, Employee>,
}

impl MemoryDirectory {
    pub(super) fn with_employees(employees: Vec<Employee>) -> Arc<Self> {
        Arc::new(Self {
            employees: employees
                .into_iter()
                .map(|employee| (employee.staff_id, employee))
                .collect(),
        })
    }
}

impl DirectoryProvider for MemoryDirectory {
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

pub(super) fn build_service(
    applications: Vec<Application>,
) -> (
    ArrangementService<MemoryStore, MemoryDirectory>,
    Arc<MemoryStore>,
) {
    let store = MemoryStore::with_applications(applications);
    let directory = MemoryDirectory::with_employees(sample_directory());
    let service = ArrangementService::new(store.clone(), directory);
    (service, store)
}
