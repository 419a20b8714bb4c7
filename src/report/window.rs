use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Working days (Monday to Friday) that a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// Window for the ISO week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date - Duration::days(date.weekday().num_days_from_monday().into());
        Self {
            start,
            end: start + Duration::days(4),
        }
    }
}

/// Returns the most recent finished work week relative to `today`.
///
/// On weekends the current week is already over, so it is used as is. On work days the current
/// week is still in progress and the previous week is returned instead.
pub fn resolve_current_window(today: NaiveDate) -> WeekWindow {
    match today.weekday() {
        Weekday::Sat | Weekday::Sun => WeekWindow::containing(today),
        _ => WeekWindow::containing(today - Duration::weeks(1)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate, Weekday};

    use super::{resolve_current_window, WeekWindow};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekend_uses_current_week() {
        let expected = WeekWindow {
            start: date(2024, 3, 4),
            end: date(2024, 3, 8),
        };
        assert_eq!(resolve_current_window(date(2024, 3, 9)), expected);
        assert_eq!(resolve_current_window(date(2024, 3, 10)), expected);
    }

    #[test]
    fn test_work_day_uses_previous_week() {
        let expected = WeekWindow {
            start: date(2024, 2, 26),
            end: date(2024, 3, 1),
        };
        for day in 4..=8 {
            assert_eq!(resolve_current_window(date(2024, 3, day)), expected);
        }
    }

    #[test]
    fn test_previous_week_crosses_iso_year() {
        // 2021-01-04 is the Monday of ISO week 2021-W01. The previous week is 2020-W53.
        let window = resolve_current_window(date(2021, 1, 4));
        assert_eq!(window.start, date(2020, 12, 28));
        assert_eq!(window.end, date(2021, 1, 1));
    }

    #[test]
    fn test_window_invariants() {
        let mut day = date(2023, 12, 1);
        while day < date(2025, 2, 1) {
            let window = resolve_current_window(day);
            assert_eq!(window.start.weekday(), Weekday::Mon);
            assert_eq!(window.end, window.start + Duration::days(4));
            assert!(window.end < day);
            day = day.succ_opt().unwrap();
        }
    }
}
