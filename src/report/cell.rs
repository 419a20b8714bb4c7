use std::fmt::Display;

use chrono::{Datelike, NaiveDate};

use super::ReportError;

/// First column of each week block in a month sheet. Every block is 4 columns wide and a month
/// has at most 5 of them.
pub const WEEK_COLUMNS: [&str; 5] = ["C", "G", "K", "O", "S"];

/// Rows above the first name in a month sheet.
pub const HEADER_ROWS: u32 = 2;

/// Spot in the spreadsheet where a report row gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAddress {
    pub sheet_name: String,
    pub column: &'static str,
    pub row: u32,
}

impl Display for CellAddress {
    /// A1 notation, e.g. `March!K5`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}!{}{}",
            quote_sheet_name(&self.sheet_name),
            self.column,
            self.row
        )
    }
}

/// Sheet titles with anything besides letters, digits and underscores need single quotes in A1
/// notation.
pub fn quote_sheet_name(title: &str) -> String {
    if title.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}

/// Picks the week block for `start` and combines it with an already offset `row`.
pub fn resolve_cell(
    sheet_name: &str,
    start: NaiveDate,
    row: u32,
) -> Result<CellAddress, ReportError> {
    let day = start.day();
    let column = WEEK_COLUMNS
        .get((day / 7) as usize)
        .ok_or(ReportError::WeekSlotOutOfRange(day))?;
    Ok(CellAddress {
        sheet_name: sheet_name.to_string(),
        column,
        row,
    })
}

/// Sheet row of `name`, counting from 1 and skipping the header rows.
pub fn row_for_name(names: &[String], name: &str) -> Option<u32> {
    names
        .iter()
        .position(|v| v == name)
        .map(|index| index as u32 + 1 + HEADER_ROWS)
}
