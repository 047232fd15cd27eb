use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, Utc};
use clap::Args;
use flexwork::error::AppError;
use flexwork::workflows::arrangements::{
    presence_overview, Application, ApplicationHour, ApplicationId, ApplicationState,
    ApplicationStatus, ArrangementEvent, ArrangementService, ArrangementSubmission, Employee,
    EventDraft, EventId, PresenceOverview, ProcessCommand, StaffArrangementsView, StaffId,
    WithdrawSelection,
};

use crate::infra::{InMemoryArrangementStore, InMemoryDirectory};

#[derive(Args, Debug, Default)]
pub(crate) struct OverviewArgs {
    /// Day to evaluate (YYYY-MM-DD); defaults to today
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the walkthrough (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

fn staff(id: u64, name: &str, department: &str, team: &str, manager: Option<u64>) -> Employee {
    Employee {
        staff_id: StaffId(id),
        name: name.to_string(),
        department: department.to_string(),
        team: team.to_string(),
        reporting_manager: manager.map(StaffId),
    }
}

/// Fixture directory: two departments, three teams, two managers.
pub(crate) fn seed_directory() -> Vec<Employee> {
    vec![
        staff(100, "Rachel Ong", "Engineering", "Platform", None),
        staff(101, "Devi Nair", "Engineering", "Platform", Some(100)),
        staff(102, "Marcus Teo", "Engineering", "Platform", Some(100)),
        staff(103, "Sofia Chen", "Engineering", "Mobile", Some(100)),
        staff(200, "Priya Menon", "Finance", "Payroll", None),
        staff(201, "Jonas Lim", "Finance", "Payroll", Some(200)),
    ]
}

fn fixture(
    id: u64,
    staff_id: u64,
    status: ApplicationStatus,
    state: ApplicationState,
    recurring: bool,
    reason: &str,
    events: Vec<(u64, NaiveDate, ApplicationHour)>,
) -> Application {
    let submitted = Utc::now() - Duration::days(10);
    Application {
        application_id: ApplicationId(id),
        staff_id: StaffId(staff_id),
        status,
        application_state: state,
        recurring,
        reason: reason.to_string(),
        created_on: submitted,
        last_updated_on: submitted,
        events: events
            .into_iter()
            .map(|(event_id, requested_date, hour)| ArrangementEvent {
                event_id: EventId(event_id),
                requested_date,
                location: "home".to_string(),
                application_hour: hour,
            })
            .collect(),
    }
}

/// Fixture applications spread around `today` so every dashboard bucket has
/// something to show.
pub(crate) fn seed_applications(today: NaiveDate) -> Vec<Application> {
    vec![
        fixture(
            9101,
            101,
            ApplicationStatus::Approved,
            ApplicationState::NewApplication,
            false,
            "school pickup",
            vec![(8101, today + Duration::days(2), ApplicationHour::Fullday)],
        ),
        fixture(
            9102,
            101,
            ApplicationStatus::Approved,
            ApplicationState::NewApplication,
            true,
            "weekly focus day",
            vec![
                (8102, today + Duration::days(7), ApplicationHour::Am),
                (8103, today + Duration::days(21), ApplicationHour::Am),
            ],
        ),
        fixture(
            9103,
            102,
            ApplicationStatus::Pending,
            ApplicationState::NewApplication,
            false,
            "renovation noise at the office",
            vec![
                (8104, today + Duration::days(5), ApplicationHour::Pm),
                (8105, today + Duration::days(12), ApplicationHour::Pm),
            ],
        ),
        fixture(
            9104,
            103,
            ApplicationStatus::Pending,
            ApplicationState::ChangeRequest,
            false,
            "move the slot to the afternoon",
            vec![(8106, today + Duration::days(3), ApplicationHour::Fullday)],
        ),
        fixture(
            9105,
            201,
            ApplicationStatus::Approved,
            ApplicationState::NewApplication,
            false,
            "payroll close prep",
            vec![(8107, today, ApplicationHour::Fullday)],
        ),
        fixture(
            9106,
            102,
            ApplicationStatus::Withdrawn,
            ApplicationState::NewApplication,
            false,
            "cancelled trip",
            vec![(8108, today + Duration::days(1), ApplicationHour::Am)],
        ),
    ]
}

pub(crate) fn run_overview(args: OverviewArgs) -> Result<(), AppError> {
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let employees = seed_directory();
    let applications = seed_applications(date);
    let overview = presence_overview(date, &employees, &applications);
    render_overview(&overview);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let directory = Arc::new(InMemoryDirectory::with_employees(seed_directory()));
    let store = Arc::new(InMemoryArrangementStore::with_applications(
        seed_applications(today),
    ));
    let service = ArrangementService::new(store, directory);

    println!("Flexible work portal demo");
    println!("Evaluation date: {today}");

    let dashboard = service.staff_dashboard(&StaffId(101), today)?;
    render_dashboard("Devi's dashboard before any changes", &dashboard);

    let submitted = service.submit(ArrangementSubmission {
        staff_id: StaffId(102),
        reason: "quarterly report writing".to_string(),
        recurring: false,
        events: vec![EventDraft {
            requested_date: today + Duration::days(9),
            location: "home".to_string(),
            application_hour: ApplicationHour::Fullday,
        }],
    })?;
    println!(
        "\nSubmitted application {} for staff {}",
        submitted.application_id, submitted.staff_id
    );

    let queue = service.review_queue(&StaffId(100))?;
    println!("\nReview queue for Rachel ({} pending)", queue.len());
    for entry in &queue {
        println!(
            "- {} | {} event(s) | {} | {}",
            entry.requester.name,
            entry.application.events.len(),
            entry.application.shape().label(),
            entry.application.reason
        );
    }

    let approved = service.process(
        &submitted.application_id,
        ProcessCommand {
            status: ApplicationStatus::Approved,
            approver_id: StaffId(100),
            application_id: submitted.application_id,
            outcome_reason: "team coverage confirmed".to_string(),
        },
    )?;
    println!(
        "\nApproved application {} ({})",
        approved.application_id,
        approved.status.label()
    );

    let withdrawn = service
        .withdraw_selection(
            &ApplicationId(9102),
            WithdrawSelection {
                event_ids: vec![EventId(8102)],
                editor_id: StaffId(101),
                withdraw_reason: "office anchor day announced".to_string(),
            },
            today,
        )
        .await?;
    println!("\nWithdrew {withdrawn} event(s) from application 9102");

    let dashboard = service.staff_dashboard(&StaffId(101), today)?;
    render_dashboard("Devi's dashboard after the withdrawal", &dashboard);

    let overview = service.overview(today)?;
    println!();
    render_overview(&overview);

    Ok(())
}

fn render_dashboard(heading: &str, view: &StaffArrangementsView) {
    println!("\n{heading}");
    if view.arrangements.pending.is_empty() {
        println!("Pending: none");
    } else {
        println!("Pending");
        for arrangement in &view.arrangements.pending {
            println!(
                "- {} | {} | {} | app {}",
                arrangement.date,
                arrangement.hour.label(),
                arrangement.shape.label(),
                arrangement.application_id
            );
        }
    }
    if view.arrangements.approved.is_empty() {
        println!("Approved (editable): none");
    } else {
        println!("Approved (editable)");
        for arrangement in &view.arrangements.approved {
            println!(
                "- {} | {} | {} | app {}",
                arrangement.date,
                arrangement.hour.label(),
                arrangement.shape.label(),
                arrangement.application_id
            );
        }
    }
    if !view.arrangements.pending_months.is_empty() {
        println!("Months with pending requests: {:?}", view.arrangements.pending_months);
    }
}

fn render_overview(overview: &PresenceOverview) {
    println!("Presence overview for {}", overview.date);
    println!(
        "Org-wide: {} home / {} office of {}",
        overview.home, overview.office, overview.headcount
    );
    for department in &overview.departments {
        println!(
            "- {}: {} home, {} office (full day {}, am {}, pm {})",
            department.department,
            department.home,
            department.office,
            department.breakdown.full_day,
            department.breakdown.morning,
            department.breakdown.afternoon
        );
        for team in &department.teams {
            println!(
                "  - {}: {} home / {} office of {}",
                team.team, team.home, team.office, team.headcount
            );
        }
    }
}
