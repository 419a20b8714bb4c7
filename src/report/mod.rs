//! Weekly report computation. Everything in here is pure: the clients fetch the data, this
//! module turns it into the three values written to the sheet.

pub mod aggregate;
pub mod cell;
pub mod window;

use chrono::{Duration, NaiveDate};

pub use aggregate::{aggregate, WeeklyReport};
pub use cell::{quote_sheet_name, resolve_cell, row_for_name, CellAddress};
pub use window::{resolve_current_window, WeekWindow};

/// Time spent on a single project during a day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTime {
    pub name: String,
    pub duration: Duration,
}

/// Activity of one calendar day, in the order the tracker reported the projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub projects: Vec<ProjectTime>,
}

impl DailySummary {
    pub fn new(date: NaiveDate, projects: impl IntoIterator<Item = (String, Duration)>) -> Self {
        Self {
            date,
            projects: projects
                .into_iter()
                .map(|(name, duration)| ProjectTime { name, duration })
                .collect(),
        }
    }
}

/// Returns project names across all days without duplicates, keeping first-seen order.
pub fn distinct_projects(summaries: &[DailySummary]) -> Vec<String> {
    let mut projects: Vec<String> = vec![];
    for project in summaries.iter().flat_map(|v| v.projects.iter()) {
        if !projects.contains(&project.name) {
            projects.push(project.name.clone());
        }
    }
    projects
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("no activity recorded for the selected projects")]
    NoActivity,

    #[error("day {0} does not fall into any of the week columns")]
    WeekSlotOutOfRange(u32),
}
