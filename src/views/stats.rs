use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Deserialize;

use super::{escape, layout, selected, table, Column, Nav, Notice};
use crate::models::Sighting;
use crate::report::{month_name, year_options, ReportMonth, FIRST_YEAR};
use crate::repo::RepoResult;

pub const NO_DATA: &str = "No sightings data available for the selected month.";

/// Columns of the monthly table. Personal details and dates stay hidden.
pub const MONTHLY_COLUMNS: &[Column] = &[
    Column { header: "sighting_location", cell: |s| s.record.sighting_location.to_string() },
    Column { header: "weather_conditions", cell: |s| s.record.weather_conditions.to_string() },
    Column { header: "crescent_sighted", cell: |s| s.record.crescent_sighted.to_string() },
    Column { header: "num_members", cell: |s| s.record.num_members.to_string() },
    Column { header: "num_non_members", cell: |s| s.record.num_non_members.to_string() },
    Column { header: "additional_info", cell: |s| s.record.additional_info.clone() },
];

/// Query string of `GET /stats`. Missing values fall back to the first option
/// of each selector.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StatsQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl StatsQuery {
    /// Resolves the selection against the selectors on offer at `today`.
    pub fn resolve(self, today: NaiveDate) -> Result<ReportMonth, String> {
        let year = self.year.unwrap_or(FIRST_YEAR);
        if !year_options(today).contains(&year) {
            return Err(format!("year {year} is outside the selectable range"));
        }
        let month = self.month.unwrap_or(1);
        ReportMonth::new(year, month).ok_or_else(|| format!("month {month} is outside the selectable range"))
    }
}

fn selectors(today: NaiveDate, current: ReportMonth) -> String {
    let mut years = String::new();
    for y in year_options(today) {
        let _ = write!(years, r#"<option value="{y}"{}>{y}</option>"#, selected(y == current.year));
    }
    let mut months = String::new();
    for m in 1..=12u32 {
        let _ = write!(
            months,
            r#"<option value="{m}"{}>{m} - {}</option>"#,
            selected(m == current.month),
            month_name(m),
        );
    }
    format!(
        r#"<form method="get" action="/stats" class="period-form">
<label>Select Year <select name="year">{years}</select></label>
<label>Select Month <select name="month">{months}</select></label>
<button type="submit">Show</button>
</form>
"#
    )
}

/// Heading and table for the month, or the matching empty/error banner.
pub fn report_section(month: ReportMonth, rows: &RepoResult<Vec<Sighting>>) -> String {
    match rows {
        Ok(rows) if rows.is_empty() => Notice::Info(NO_DATA.into()).render(),
        Ok(rows) => format!(
            "<h2>Statistics for {}</h2>\n{}",
            escape(&month.long_name()),
            table(MONTHLY_COLUMNS, rows),
        ),
        Err(e) => Notice::Error(format!("An error occurred while retrieving data: {e}")).render(),
    }
}

pub fn render(today: NaiveDate, month: ReportMonth, rows: &RepoResult<Vec<Sighting>>) -> String {
    let content = format!("{}{}", selectors(today, month), report_section(month, rows));
    layout(Nav::Stats, "Monthly Crescent Sighting Statistics", &content)
}
