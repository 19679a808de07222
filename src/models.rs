use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

// Store-managed primary key
pub type Id = i64;

/// Layout of `submit_date_time`; the underscore separator is what existing rows use.
pub const SUBMIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of values stored as their display text.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name { $($variant),+ }

        impl $name {
            /// Every value, in the order the form lists them.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self { $($name::$variant => $text),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.serialize_str(self.as_str()) }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(d)?;
                raw.parse().map_err(de::Error::custom)
            }
        }

        impl PartialEq<$name> for Recorded<$name> {
            fn eq(&self, other: &$name) -> bool { self.listed() == Some(other) }
        }
    };
}

string_enum!(
    /// Where the observation was made.
    SightingLocation, "sighting location" {
        SignalHill => "Signal Hill",
        ThreeAnchorBay => "Three Anchor Bay",
        GordonsBay => "Gordons Bay",
        Bakoven => "Bakoven",
        Stellenbosch => "Stellenbosch",
        Grabouw => "Grabouw",
        Other => "Other",
    }
);

string_enum!(
    /// A single weather tag. Ordering follows the checkbox list.
    WeatherCondition, "weather condition" {
        Cloudy => "Cloudy",
        Hazy => "Hazy",
        RedHorizon => "Red Horizon",
        Clear => "Clear",
        Misty => "Misty",
        Other => "Other",
    }
);

string_enum!(
    CrescentSighted, "crescent sighted value" {
        Yes => "Yes",
        No => "No",
    }
);

impl Default for SightingLocation {
    fn default() -> Self { SightingLocation::SignalHill }
}

impl Default for CrescentSighted {
    fn default() -> Self { CrescentSighted::Yes }
}

/// A stored enum column. Values outside the listed set, blanks included,
/// are kept verbatim so older rows still load and display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recorded<T> {
    Listed(T),
    Unlisted(String),
}

impl<T> Recorded<T> {
    pub fn listed(&self) -> Option<&T> {
        match self {
            Recorded::Listed(v) => Some(v),
            Recorded::Unlisted(_) => None,
        }
    }
}

impl<T> Default for Recorded<T> {
    /// The blank value.
    fn default() -> Self { Recorded::Unlisted(String::new()) }
}

impl<T> From<T> for Recorded<T> {
    fn from(v: T) -> Self { Recorded::Listed(v) }
}

impl<T: fmt::Display> fmt::Display for Recorded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recorded::Listed(v) => v.fmt(f),
            Recorded::Unlisted(raw) => f.write_str(raw),
        }
    }
}

impl<T: FromStr> FromStr for Recorded<T> {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse().map(Recorded::Listed).unwrap_or_else(|_| Recorded::Unlisted(s.to_string())))
    }
}

impl<T: fmt::Display> Serialize for Recorded<T> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.collect_str(self) }
}

impl<'de, T: FromStr> Deserialize<'de> for Recorded<T> {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok(raw.parse().unwrap_or_default())
    }
}

/// Weather tags of one sighting.
///
/// Stored as one `", "`-joined string: listed tags in checkbox order, whatever
/// order they were picked in, then any unlisted text from older rows as it
/// was stored. The empty set is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherConditions {
    tags: BTreeSet<WeatherCondition>,
    unlisted: Vec<String>,
}

impl WeatherConditions {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, tag: WeatherCondition) -> bool { self.tags.insert(tag) }

    pub fn contains(&self, tag: WeatherCondition) -> bool { self.tags.contains(&tag) }

    pub fn is_empty(&self) -> bool { self.tags.is_empty() && self.unlisted.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = WeatherCondition> + '_ { self.tags.iter().copied() }

    pub fn unlisted(&self) -> &[String] { &self.unlisted }
}

impl FromIterator<WeatherCondition> for WeatherConditions {
    fn from_iter<I: IntoIterator<Item = WeatherCondition>>(iter: I) -> Self {
        Self { tags: iter.into_iter().collect(), unlisted: Vec::new() }
    }
}

impl fmt::Display for WeatherConditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.tags.iter().map(|t| t.as_str()).chain(self.unlisted.iter().map(String::as_str));
        for (i, part) in parts.enumerate() {
            if i > 0 { f.write_str(", ")?; }
            f.write_str(part)?;
        }
        Ok(())
    }
}

impl FromStr for WeatherConditions {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = Self::new();
        for part in s.split(',').map(str::trim).filter(|part| !part.is_empty()) {
            match part.parse() {
                Ok(tag) => { out.tags.insert(tag); }
                Err(_) => out.unlisted.push(part.to_string()),
            }
        }
        Ok(out)
    }
}

impl Serialize for WeatherConditions {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.collect_str(self) }
}

impl<'de> Deserialize<'de> for WeatherConditions {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok(raw.parse().unwrap_or_default())
    }
}

/// Submission instant, rendered as `YYYY-MM-DD_HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubmitTimestamp(pub NaiveDateTime);

impl SubmitTimestamp {
    /// Current local time truncated to whole seconds.
    pub fn now() -> Self {
        let now = Local::now().naive_local();
        Self(now.with_nanosecond(0).unwrap_or(now))
    }
}

impl fmt::Display for SubmitTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SUBMIT_TIMESTAMP_FORMAT))
    }
}

impl FromStr for SubmitTimestamp {
    type Err = chrono::ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDateTime::parse_from_str(s, SUBMIT_TIMESTAMP_FORMAT).map(Self)
    }
}

impl Serialize for SubmitTimestamp {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> { s.collect_str(self) }
}

impl<'de> Deserialize<'de> for SubmitTimestamp {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// `HH:MM:SS` on the wire; reads also accept `HH:MM` and fractional seconds.
pub mod hms {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TIME_FORMAT;

    pub fn parse(raw: &str) -> Option<NaiveTime> {
        ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
    }

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&t.format(TIME_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid time '{raw}'")))
    }
}

fn default_if_null<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Record as submitted by the form, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSighting {
    pub date_of_sighting: NaiveDate,
    #[serde(with = "hms")]
    pub time_of_sighting: NaiveTime,
    #[serde(default, deserialize_with = "default_if_null")]
    pub name: String,
    #[serde(default, deserialize_with = "default_if_null")]
    pub email: String,
    #[serde(default)]
    pub sighting_location: Recorded<SightingLocation>,
    #[serde(default)]
    pub weather_conditions: WeatherConditions,
    #[serde(default)]
    pub crescent_sighted: Recorded<CrescentSighted>,
    #[serde(default, deserialize_with = "default_if_null")]
    pub num_members: u32,
    #[serde(default, deserialize_with = "default_if_null")]
    pub num_non_members: u32,
    #[serde(default, deserialize_with = "default_if_null")]
    pub additional_info: String,
    pub submit_date_time: SubmitTimestamp,
}

/// A persisted row. Unknown columns returned by the store are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sighting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub record: NewSighting,
}

impl Sighting {
    pub fn submitted_at(&self) -> SubmitTimestamp { self.record.submit_date_time }
}

/// Column and direction for the recency query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub const fn newest_first() -> Self {
        Self { field: "submit_date_time", descending: true }
    }
}
