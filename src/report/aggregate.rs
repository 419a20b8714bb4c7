use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use tracing::{debug, instrument};

use crate::utils::time::{format_duration, format_sheet_date, round_to_seconds};

use super::{DailySummary, ReportError};

/// Result of [aggregate]. Durations are kept unrounded; rounding only happens in the display
/// accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    /// Total time for the selected projects, one entry per day in the window.
    pub daily_totals: Vec<Duration>,
    pub days_worked: u32,
    pub cumulative_total: Duration,
    pub daily_average: Duration,
    pub most_active_day: usize,
    pub most_active_date: NaiveDate,
}

impl WeeklyReport {
    pub fn rounded_daily_average(&self) -> Duration {
        round_to_seconds(self.daily_average)
    }

    pub fn rounded_cumulative_total(&self) -> Duration {
        round_to_seconds(self.cumulative_total)
    }

    /// Values in the order the sheet expects them: daily average, most active day, total.
    pub fn sheet_row(&self) -> Vec<String> {
        vec![
            format_duration(self.rounded_daily_average()),
            format_sheet_date(self.most_active_date),
            format_duration(self.rounded_cumulative_total()),
        ]
    }
}

/// Builds a weekly report out of daily summaries, counting only `selected` projects.
///
/// Days without activity are skipped when computing the average, the same way WakaTime computes
/// its own daily average. Fails with [ReportError::NoActivity] if no day has any time.
#[instrument(skip(summaries, selected), fields(days = summaries.len()))]
pub fn aggregate(
    summaries: &[DailySummary],
    selected: &HashSet<String>,
) -> Result<WeeklyReport, ReportError> {
    let daily_totals = summaries
        .iter()
        .map(|day| {
            day.projects
                .iter()
                .filter(|v| selected.contains(&v.name))
                .fold(Duration::zero(), |total, v| total + v.duration)
        })
        .collect::<Vec<_>>();

    let mut most_active_day = 0;
    for (index, total) in daily_totals.iter().enumerate() {
        if *total > daily_totals[most_active_day] {
            most_active_day = index;
        }
    }

    let mut days_worked = 0u32;
    let mut cumulative_total = Duration::zero();
    for total in &daily_totals {
        if *total <= Duration::zero() {
            continue;
        }
        days_worked += 1;
        cumulative_total += *total;
    }

    if days_worked == 0 {
        return Err(ReportError::NoActivity);
    }

    let daily_average = cumulative_total / days_worked as i32;
    debug!("Worked {days_worked} days, {cumulative_total} in total, {daily_average} on average");

    Ok(WeeklyReport {
        most_active_date: summaries[most_active_day].date,
        daily_totals,
        days_worked,
        cumulative_total,
        daily_average,
        most_active_day,
    })
}
