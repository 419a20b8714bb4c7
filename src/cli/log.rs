use std::collections::HashSet;

use ansi_term::Colour;
use anyhow::{anyhow, Context, Result};
use chrono::Datelike;
use tracing::{debug, info, instrument};

use crate::{
    app::Application,
    report::{
        aggregate, distinct_projects, quote_sheet_name, resolve_cell, resolve_current_window,
        row_for_name, CellAddress, ReportError, WeekWindow, WeeklyReport,
    },
    sheets::{names_from_columns, sheet_for_month, SheetProperties},
};

const NAME_PROMPT: &str =
    "Enter your name (as seen on the Google Sheets document - case sensitive)";
const PROJECTS_PROMPT: &str = "Select projects to get weekly activity from";
const NO_PROJECTS: &str = "No projects data found for period. \
    Don't have WakaTime? Install WakaTime plugin on your IDE to get started.";

/// How a `log` run ended. Everything except [LogOutcome::Updated] leaves the sheet untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutcome {
    Updated {
        cell: CellAddress,
        link: String,
        report: WeeklyReport,
    },
    NoNames,
    NoProjects(WeekWindow),
    NoActivity(WeekWindow),
}

impl LogOutcome {
    pub fn message(&self) -> String {
        match self {
            LogOutcome::Updated { link, .. } => format!(
                "Sheet updated successfully :)\nView sheet {}.",
                hyperlink("here", link)
            ),
            LogOutcome::NoNames => "No username data found.".into(),
            LogOutcome::NoProjects(_) => NO_PROJECTS.into(),
            LogOutcome::NoActivity(window) => format!(
                "No activity recorded for the selected projects between {} and {}.",
                window.start, window.end
            ),
        }
    }
}

/// Writes last week's report for the user into their row of the month sheet.
#[instrument(skip_all)]
pub async fn run_log(app: &Application) -> Result<LogOutcome> {
    let window = resolve_current_window(app.clock.today());
    info!("Reporting week {} - {}", window.start, window.end);

    let sheets = app.spreadsheet.sheets().await?;
    let sheet = match sheet_for_month(&sheets, window.start.month()) {
        Some(sheet) => sheet.clone(),
        None => choose_sheet(app, &sheets, window)?,
    };
    debug!("Using sheet {sheet:?}");

    let range = format!("{}!B3:B", quote_sheet_name(&sheet.title));
    let columns = app
        .spreadsheet
        .column_values(&range)
        .await
        .context("error retrieving usernames on sheet")?;
    let names = names_from_columns(columns);
    let candidates = names
        .iter()
        .filter(|v| !v.is_empty())
        .cloned()
        .collect::<Vec<_>>();
    if candidates.is_empty() {
        return Ok(LogOutcome::NoNames);
    }

    let name = app.prompter.input_one_of(NAME_PROMPT, candidates)?;
    let row = row_for_name(&names, &name)
        .ok_or_else(|| anyhow!("{name} is not listed on sheet {}", sheet.title))?;

    let summaries = app.time_tracker.summaries(window).await?;
    let projects = distinct_projects(&summaries);
    if projects.is_empty() {
        return Ok(LogOutcome::NoProjects(window));
    }

    let selected = app
        .prompter
        .multi_select(PROJECTS_PROMPT, projects)?
        .into_iter()
        .collect::<HashSet<_>>();

    let report = match aggregate(&summaries, &selected) {
        Ok(report) => report,
        Err(ReportError::NoActivity) => return Ok(LogOutcome::NoActivity(window)),
        Err(e) => return Err(e.into()),
    };

    let cell = resolve_cell(&sheet.title, window.start, row)?;
    app.spreadsheet
        .batch_update_values(&cell.to_string(), vec![report.sheet_row()])
        .await?;

    Ok(LogOutcome::Updated {
        cell,
        link: app.spreadsheet.sheet_link(sheet.sheet_id),
        report,
    })
}

fn choose_sheet(
    app: &Application,
    sheets: &[SheetProperties],
    window: WeekWindow,
) -> Result<SheetProperties> {
    if sheets.is_empty() {
        return Err(anyhow!("spreadsheet has no sheets"));
    }
    let month = window.start.format("%B");
    let titles = sheets.iter().map(|v| v.title.clone()).collect();
    let title = app
        .prompter
        .select(&format!("No sheet found for {month}. Select one"), titles)?;
    sheets
        .iter()
        .find(|v| v.title == title)
        .cloned()
        .ok_or_else(|| anyhow!("sheet {title} does not exist"))
}

/// OSC 8 terminal hyperlink. Terminals without support show the text only.
fn hyperlink(text: &str, url: &str) -> String {
    format!(
        "\x1b]8;;{url}\x1b\\{}\x1b]8;;\x1b\\",
        Colour::Blue.paint(text)
    )
}
