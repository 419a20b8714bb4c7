use chrono::{Duration, NaiveDate};
use serde::Deserialize;

use crate::report::DailySummary;

/// Response of `/users/current/summaries`. Only the fields the report uses are kept.
#[derive(Debug, Deserialize)]
pub struct SummariesResponse {
    pub data: Vec<SummaryEntity>,
}

/// A single day of the summaries response.
#[derive(Debug, Deserialize)]
pub struct SummaryEntity {
    pub range: SummaryRange,
    #[serde(default)]
    pub projects: Vec<ProjectEntity>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRange {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ProjectEntity {
    pub name: String,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

impl ProjectEntity {
    pub fn duration(&self) -> Duration {
        Duration::hours(self.hours)
            + Duration::minutes(self.minutes)
            + Duration::seconds(self.seconds)
    }
}

impl From<SummaryEntity> for DailySummary {
    fn from(SummaryEntity { range, projects }: SummaryEntity) -> Self {
        let projects = projects.into_iter().map(|v| {
            let duration = v.duration();
            (v.name, duration)
        });
        DailySummary::new(range.date, projects)
    }
}

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub data: UserEntity,
}

#[derive(Debug, Deserialize)]
pub struct UserEntity {
    pub username: Option<String>,
    pub display_name: Option<String>,
}

/// Body WakaTime sends along with failed requests. Either field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEntity {
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}
