use std::fmt::Write as _;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer};

use super::{escape, layout, selected, table, Column, Nav, Notice};
use crate::models::*;
use crate::repo::RepoResult;

/// How many rows the "last entries" table shows.
pub const RECENT_LIMIT: usize = 10;

pub const SUBMITTED: &str = "Sighting successfully submitted!";
pub const NOT_ACKNOWLEDGED: &str = "Failed to submit sighting. Please try again.";
pub const NO_ENTRIES: &str = "No entries found.";

/// Columns of the recent-entries table. Name, email and submit time stay hidden.
pub const RECENT_COLUMNS: &[Column] = &[
    Column { header: "date_of_sighting", cell: |s| s.record.date_of_sighting.format(DATE_FORMAT).to_string() },
    Column { header: "time_of_sighting", cell: |s| s.record.time_of_sighting.format(TIME_FORMAT).to_string() },
    Column { header: "sighting_location", cell: |s| s.record.sighting_location.to_string() },
    Column { header: "weather_conditions", cell: |s| s.record.weather_conditions.to_string() },
    Column { header: "crescent_sighted", cell: |s| s.record.crescent_sighted.to_string() },
    Column { header: "num_members", cell: |s| s.record.num_members.to_string() },
    Column { header: "num_non_members", cell: |s| s.record.num_non_members.to_string() },
    Column { header: "additional_info", cell: |s| s.record.additional_info.clone() },
];

/// Body of `POST /submit`. Each weather tag is its own checkbox.
#[derive(Debug, Clone, Deserialize)]
pub struct SightingForm {
    pub date_of_sighting: NaiveDate,
    #[serde(deserialize_with = "hms::deserialize")]
    pub time_of_sighting: NaiveTime,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "listed_or_blank")]
    pub sighting_location: Recorded<SightingLocation>,
    #[serde(default)]
    pub weather_cloudy: bool,
    #[serde(default)]
    pub weather_hazy: bool,
    #[serde(default)]
    pub weather_red_horizon: bool,
    #[serde(default)]
    pub weather_clear: bool,
    #[serde(default)]
    pub weather_misty: bool,
    #[serde(default)]
    pub weather_other: bool,
    pub crescent_sighted: CrescentSighted,
    #[serde(default)]
    pub num_members: u32,
    #[serde(default)]
    pub num_non_members: u32,
    #[serde(default)]
    pub additional_info: String,
}

/// A blank location is stored as blank; anything else must be a listed option.
fn listed_or_blank<'de, D: Deserializer<'de>>(d: D) -> Result<Recorded<SightingLocation>, D::Error> {
    let raw = String::deserialize(d)?;
    if raw.trim().is_empty() {
        return Ok(Recorded::default());
    }
    raw.parse::<SightingLocation>().map(Recorded::Listed).map_err(de::Error::custom)
}

fn checkbox_name(tag: WeatherCondition) -> &'static str {
    match tag {
        WeatherCondition::Cloudy => "weather_cloudy",
        WeatherCondition::Hazy => "weather_hazy",
        WeatherCondition::RedHorizon => "weather_red_horizon",
        WeatherCondition::Clear => "weather_clear",
        WeatherCondition::Misty => "weather_misty",
        WeatherCondition::Other => "weather_other",
    }
}

impl SightingForm {
    pub fn weather(&self) -> WeatherConditions {
        let ticked = [
            (WeatherCondition::Cloudy, self.weather_cloudy),
            (WeatherCondition::Hazy, self.weather_hazy),
            (WeatherCondition::RedHorizon, self.weather_red_horizon),
            (WeatherCondition::Clear, self.weather_clear),
            (WeatherCondition::Misty, self.weather_misty),
            (WeatherCondition::Other, self.weather_other),
        ];
        ticked.into_iter().filter(|(_, on)| *on).map(|(tag, _)| tag).collect()
    }

    /// Builds the record to insert, stamped with `submitted_at`.
    pub fn into_new_sighting(self, submitted_at: SubmitTimestamp) -> NewSighting {
        let weather_conditions = self.weather();
        NewSighting {
            date_of_sighting: self.date_of_sighting,
            time_of_sighting: self.time_of_sighting.with_nanosecond(0).unwrap_or(self.time_of_sighting),
            name: self.name,
            email: self.email,
            sighting_location: self.sighting_location,
            weather_conditions,
            crescent_sighted: self.crescent_sighted.into(),
            num_members: self.num_members,
            num_non_members: self.num_non_members,
            additional_info: self.additional_info,
            submit_date_time: submitted_at,
        }
    }
}

/// Banner for the result of an insert.
pub fn insert_notice(result: &RepoResult<Vec<Sighting>>) -> Notice {
    match result {
        Ok(rows) if !rows.is_empty() => Notice::Success(SUBMITTED.into()),
        Ok(_) => Notice::Error(NOT_ACKNOWLEDGED.into()),
        Err(e) => Notice::Error(format!("An error occurred: {e}")),
    }
}

fn form(today: NaiveDate, now: NaiveTime) -> String {
    let mut locations = String::new();
    for loc in SightingLocation::ALL {
        let _ = write!(
            locations,
            r#"<option value="{0}"{1}>{0}</option>"#,
            escape(loc.as_str()),
            selected(*loc == SightingLocation::default()),
        );
    }
    let mut weather = String::new();
    for tag in WeatherCondition::ALL {
        let _ = write!(
            weather,
            r#"<label><input type="checkbox" name="{}" value="true"> {}</label>"#,
            checkbox_name(*tag),
            escape(tag.as_str()),
        );
    }
    let mut sighted = String::new();
    for v in CrescentSighted::ALL {
        let _ = write!(sighted, r#"<option value="{0}">{0}</option>"#, v.as_str());
    }
    format!(
        r#"<form method="post" action="/submit" class="sighting-form">
<label>Date of Sighting <input type="date" name="date_of_sighting" value="{date}" required></label>
<label>Time of Sighting (HH:MM:SS) <input type="time" name="time_of_sighting" value="{time}" step="1" required></label>
<label>Name <input type="text" name="name"></label>
<label>Email <input type="text" name="email"></label>
<label>Sighting Location <select name="sighting_location">{locations}</select></label>
<fieldset><legend>Weather Conditions (select all that apply):</legend>{weather}</fieldset>
<label>Crescent Sighted <select name="crescent_sighted">{sighted}</select></label>
<label>Number of Members <input type="number" name="num_members" value="0" min="0" step="1" required></label>
<label>Number of Non-members <input type="number" name="num_non_members" value="0" min="0" step="1" required></label>
<label>Any Additional Information? <textarea name="additional_info"></textarea></label>
<button type="submit">Submit Sighting</button>
</form>
"#,
        date = today.format(DATE_FORMAT),
        time = now.format(TIME_FORMAT),
    )
}

/// Table of the latest rows, or the matching empty/error banner.
pub fn recent_section(recent: &RepoResult<Vec<Sighting>>) -> String {
    let mut out = String::from("<h2>Last 10 Entries</h2>\n");
    match recent {
        Ok(rows) if rows.is_empty() => out.push_str(&Notice::Info(NO_ENTRIES.into()).render()),
        Ok(rows) => {
            let shown = &rows[..rows.len().min(RECENT_LIMIT)];
            out.push_str(&table(RECENT_COLUMNS, shown));
        }
        Err(e) => out.push_str(
            &Notice::Error(format!("An error occurred while retrieving last entries: {e}")).render(),
        ),
    }
    out
}

/// Full submission page. `now` pre-fills the date and time pickers.
pub fn render(now: chrono::NaiveDateTime, outcome: Option<&Notice>, recent: &RepoResult<Vec<Sighting>>) -> String {
    let mut content = String::new();
    if let Some(n) = outcome {
        content.push_str(&n.render());
        content.push('\n');
    }
    let time = now.time().with_nanosecond(0).unwrap_or(now.time());
    content.push_str(&form(now.date(), time));
    content.push_str(&recent_section(recent));
    layout(Nav::Submit, "Crescent Moon Sighting Submission", &content)
}
