use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Application, ApplicationHour, ApplicationStatus, Employee, StaffId};

/// Office/home presence for one calendar day, grouped by department and
/// team. Derived on demand from the directory and the approved
/// applications; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceOverview {
    pub date: NaiveDate,
    pub headcount: usize,
    pub home: usize,
    pub office: usize,
    pub departments: Vec<DepartmentPresence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentPresence {
    pub department: String,
    pub headcount: usize,
    pub home: usize,
    pub office: usize,
    pub breakdown: PresenceBreakdown,
    pub teams: Vec<TeamPresence>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamPresence {
    pub team: String,
    pub headcount: usize,
    pub home: usize,
    pub office: usize,
    pub breakdown: PresenceBreakdown,
}

/// How the at-home staff split across the day.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct PresenceBreakdown {
    pub full_day: usize,
    pub morning: usize,
    pub afternoon: usize,
}

impl PresenceBreakdown {
    fn record(&mut self, hour: ApplicationHour) {
        match hour {
            ApplicationHour::Fullday => self.full_day += 1,
            ApplicationHour::Am => self.morning += 1,
            ApplicationHour::Pm => self.afternoon += 1,
        }
    }
}

/// Aggregate presence for `date`. A staff member counts as at home when any
/// approved event of theirs falls on that day; staff without one count as in
/// office. Applications for staff missing from the directory are ignored.
pub fn presence_overview(
    date: NaiveDate,
    employees: &[Employee],
    applications: &[Application],
) -> PresenceOverview {
    let known: HashSet<StaffId> = employees.iter().map(|employee| employee.staff_id).collect();

    // Strongest stint per staff member for the day: a full-day event wins
    // over a half-day one, am and pm together count as a full day.
    let mut stints: HashMap<StaffId, (bool, bool)> = HashMap::new();
    for application in applications {
        if application.status != ApplicationStatus::Approved
            || !known.contains(&application.staff_id)
        {
            continue;
        }
        for event in &application.events {
            if event.requested_date != date {
                continue;
            }
            let entry = stints.entry(application.staff_id).or_default();
            match event.application_hour {
                ApplicationHour::Fullday => *entry = (true, true),
                ApplicationHour::Am => entry.0 = true,
                ApplicationHour::Pm => entry.1 = true,
            }
        }
    }

    let mut departments: BTreeMap<String, BTreeMap<String, (usize, PresenceBreakdown, usize)>> =
        BTreeMap::new();
    for employee in employees {
        let team = departments
            .entry(employee.department.clone())
            .or_default()
            .entry(employee.team.clone())
            .or_insert((0, PresenceBreakdown::default(), 0));
        team.0 += 1;
        if let Some(&(am, pm)) = stints.get(&employee.staff_id) {
            team.2 += 1;
            team.1.record(match (am, pm) {
                (true, true) => ApplicationHour::Fullday,
                (true, false) => ApplicationHour::Am,
                _ => ApplicationHour::Pm,
            });
        }
    }

    let mut overview = PresenceOverview {
        date,
        headcount: 0,
        home: 0,
        office: 0,
        departments: Vec::new(),
    };

    for (department, teams) in departments {
        let mut presence = DepartmentPresence {
            department,
            headcount: 0,
            home: 0,
            office: 0,
            breakdown: PresenceBreakdown::default(),
            teams: Vec::new(),
        };
        for (team, (headcount, breakdown, home)) in teams {
            presence.headcount += headcount;
            presence.home += home;
            presence.breakdown.full_day += breakdown.full_day;
            presence.breakdown.morning += breakdown.morning;
            presence.breakdown.afternoon += breakdown.afternoon;
            presence.teams.push(TeamPresence {
                team,
                headcount,
                home,
                office: headcount - home,
                breakdown,
            });
        }
        presence.office = presence.headcount - presence.home;
        overview.headcount += presence.headcount;
        overview.home += presence.home;
        overview.departments.push(presence);
    }
    overview.office = overview.headcount - overview.home;
    overview
}
