use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Month, NaiveDate};

use crate::models::Sighting;
use crate::repo::{RepoResult, SightingRepo};

/// Earliest year offered by the report's year selector.
pub const FIRST_YEAR: i32 = 2024;

/// A calendar month selected in the reporting view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportMonth {
    pub year: i32,
    pub month: u32,
}

impl ReportMonth {
    /// `None` unless `month` is 1-12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Long form such as "March 2025".
    pub fn long_name(&self) -> String {
        format!("{} {}", month_name(self.month), self.year)
    }
}

pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

/// Years the selector offers, `FIRST_YEAR` through the year of `today`.
pub fn year_options(today: NaiveDate) -> RangeInclusive<i32> {
    FIRST_YEAR..=today.year().max(FIRST_YEAR)
}

/// Keeps rows whose sighting date falls in `month`, preserving store order.
pub fn filter_by_month(rows: Vec<Sighting>, month: ReportMonth) -> Vec<Sighting> {
    rows.into_iter()
        .filter(|s| month.contains(s.record.date_of_sighting))
        .collect()
}

/// Source of the rows shown in the monthly report.
#[async_trait]
pub trait MonthlyReport: Send + Sync {
    async fn sightings_for_month(&self, month: ReportMonth) -> RepoResult<Vec<Sighting>>;
}

/// Reads the whole table and filters in process. Cost grows with the table;
/// a store-side date filter can replace this behind the same trait.
pub struct FullScanReport {
    repo: Arc<dyn SightingRepo>,
}

impl FullScanReport {
    pub fn new(repo: Arc<dyn SightingRepo>) -> Self { Self { repo } }
}

#[async_trait]
impl MonthlyReport for FullScanReport {
    async fn sightings_for_month(&self, month: ReportMonth) -> RepoResult<Vec<Sighting>> {
        let rows = self.repo.select_all().await?;
        Ok(filter_by_month(rows, month))
    }
}
