use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use thiserror::Error;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

use crate::config::Locale;
use crate::night;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");
time::serde::format_description!(clock_time, Time, "[hour]:[minute]");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("quality must be between 1 and 5, got {0}")]
    InvalidQuality(u8),
    #[error("invalid clock time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum SleepType {
    #[serde(alias = "nocturne")]
    #[strum(to_string = "nocturnal", serialize = "nocturne")]
    Nocturnal,
    #[serde(alias = "sieste")]
    #[strum(to_string = "nap", serialize = "sieste")]
    Nap,
    #[serde(alias = "somnolence")]
    #[strum(to_string = "drowsiness", serialize = "somnolence")]
    Drowsiness,
    #[serde(alias = "rattrapage")]
    #[strum(to_string = "catchup", serialize = "catch-up", serialize = "rattrapage")]
    Catchup,
}

impl SleepType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn all() -> impl Iterator<Item = SleepType> {
        SleepType::iter()
    }

    /// Position in [`SleepType::all`], used to index per-type tallies.
    pub fn index(self) -> usize {
        match self {
            SleepType::Nocturnal => 0,
            SleepType::Nap => 1,
            SleepType::Drowsiness => 2,
            SleepType::Catchup => 3,
        }
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::En, SleepType::Nocturnal) => "Nocturnal sleep",
            (Locale::En, SleepType::Nap) => "Nap",
            (Locale::En, SleepType::Drowsiness) => "Drowsiness",
            (Locale::En, SleepType::Catchup) => "Catch-up sleep",
            (Locale::Fr, SleepType::Nocturnal) => "Sommeil nocturne",
            (Locale::Fr, SleepType::Nap) => "Sieste",
            (Locale::Fr, SleepType::Drowsiness) => "Somnolence",
            (Locale::Fr, SleepType::Catchup) => "Rattrapage nocturne",
        }
    }
}

impl Default for SleepType {
    fn default() -> Self {
        SleepType::Nocturnal
    }
}

impl fmt::Display for SleepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal rating from 1 (very poor) to 5 (very good).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const LEVELS: usize = (Self::MAX - Self::MIN + 1) as usize;

    pub fn new(value: u8) -> Result<Self, ModelError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ModelError::InvalidQuality(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn all() -> impl Iterator<Item = Quality> {
        (Self::MIN..=Self::MAX).map(Quality)
    }

    pub fn label(self, locale: Locale) -> &'static str {
        match (locale, self.0) {
            (Locale::En, 1) => "Very poor",
            (Locale::En, 2) => "Poor",
            (Locale::En, 3) => "Average",
            (Locale::En, 4) => "Good",
            (Locale::En, _) => "Very good",
            (Locale::Fr, 1) => "Très mauvais",
            (Locale::Fr, 2) => "Mauvais",
            (Locale::Fr, 3) => "Moyen",
            (Locale::Fr, 4) => "Bon",
            (Locale::Fr, _) => "Très bon",
        }
    }

    pub(crate) fn slot(self) -> usize {
        (self.0 - Self::MIN) as usize
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u8> for Quality {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(value: Quality) -> Self {
        value.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepRecord {
    pub id: String,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub sleep_type: SleepType,
    #[serde(with = "clock_time")]
    pub bed_time: Time,
    #[serde(with = "clock_time")]
    pub wake_time: Time,
    pub sleep_quality: Quality,
    pub wake_quality: Quality,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SleepRecord {
    pub fn duration_minutes(&self) -> i64 {
        night::sleep_duration_minutes(self.bed_time, self.wake_time)
    }

    /// Night bucket this record is grouped under. Derived on every call.
    pub fn night(&self) -> Date {
        night::night_date(self.date, self.bed_time, self.sleep_type)
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SleepDraft {
    pub date: Date,
    pub sleep_type: SleepType,
    pub bed_time: Time,
    pub wake_time: Time,
    pub sleep_quality: Quality,
    pub wake_quality: Quality,
}

impl SleepDraft {
    pub fn into_record(self, id: String, now: OffsetDateTime) -> SleepRecord {
        SleepRecord {
            id,
            date: self.date,
            sleep_type: self.sleep_type,
            bed_time: self.bed_time,
            wake_time: self.wake_time,
            sleep_quality: self.sleep_quality,
            wake_quality: self.wake_quality,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SleepPatch {
    pub date: Option<Date>,
    pub sleep_type: Option<SleepType>,
    pub bed_time: Option<Time>,
    pub wake_time: Option<Time>,
    pub sleep_quality: Option<Quality>,
    pub wake_quality: Option<Quality>,
}

impl SleepPatch {
    pub fn is_empty(&self) -> bool {
        self == &SleepPatch::default()
    }

    pub fn apply(&self, record: &mut SleepRecord, now: OffsetDateTime) {
        if let Some(date) = self.date {
            record.date = date;
        }
        if let Some(sleep_type) = self.sleep_type {
            record.sleep_type = sleep_type;
        }
        if let Some(bed_time) = self.bed_time {
            record.bed_time = bed_time;
        }
        if let Some(wake_time) = self.wake_time {
            record.wake_time = wake_time;
        }
        if let Some(quality) = self.sleep_quality {
            record.sleep_quality = quality;
        }
        if let Some(quality) = self.wake_quality {
            record.wake_quality = quality;
        }
        record.updated_at = now;
    }
}

pub fn parse_date(input: &str) -> Result<Date, ModelError> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| ModelError::InvalidDate(input.to_string()))
}

/// Parses `HH:MM`, also accepting `7:05` and `22h30`.
pub fn parse_clock(input: &str) -> Result<Time, ModelError> {
    static CLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(\d{1,2})[:hH](\d{2})$").expect("valid clock time pattern")
    });
    let invalid = || ModelError::InvalidTime(input.to_string());
    let caps = CLOCK.captures(input.trim()).ok_or_else(invalid)?;
    let hour: u8 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u8 = caps[2].parse().map_err(|_| invalid())?;
    Time::from_hms(hour, minute, 0).map_err(|_| invalid())
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn format_clock(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}
