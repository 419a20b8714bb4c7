use crate::{
    cli::prompt::Prompter, sheets::SpreadsheetService, utils::clock::Clock, wakatime::TimeTracker,
};

/// Collaborators of a single `log` run. Built once in [crate::cli::run_cli] after credentials are
/// known, replaced with mocks in tests.
pub struct Application {
    pub time_tracker: Box<dyn TimeTracker>,
    pub spreadsheet: Box<dyn SpreadsheetService>,
    pub prompter: Box<dyn Prompter>,
    pub clock: Box<dyn Clock>,
}
