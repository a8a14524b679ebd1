use crate::error::{config_error, AppResult};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Date-time layouts accepted for timestamps without an offset
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// The zone whose calendar days the grid shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayZone {
    /// The system's local time
    Local,
    /// A named IANA zone
    Named(Tz),
}

/// An event timestamp expressed in the display zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    At(NaiveDateTime),
    AllDay(NaiveDate),
}

impl EventTime {
    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::At(dt) => dt.date(),
            EventTime::AllDay(date) => *date,
        }
    }

    /// `HH:MM`, or `None` for all-day values
    pub fn clock(&self) -> Option<String> {
        match self {
            EventTime::At(dt) => Some(dt.format("%H:%M").to_string()),
            EventTime::AllDay(_) => None,
        }
    }
}

impl DisplayZone {
    /// Zone for an optional `TIMEZONE` setting
    pub fn from_setting(setting: Option<&str>) -> AppResult<Self> {
        match setting {
            None => Ok(DisplayZone::Local),
            Some(name) => name
                .parse::<Tz>()
                .map(DisplayZone::Named)
                .map_err(|_| config_error(&format!("Unknown timezone: {}", name))),
        }
    }

    /// Today's date in this zone
    pub fn today(&self) -> NaiveDate {
        match self {
            DisplayZone::Local => Local::now().date_naive(),
            DisplayZone::Named(tz) => Utc::now().with_timezone(tz).date_naive(),
        }
    }

    fn wall_time(&self, dt: &DateTime<FixedOffset>) -> NaiveDateTime {
        match self {
            DisplayZone::Local => dt.with_timezone(&Local).naive_local(),
            DisplayZone::Named(tz) => dt.with_timezone(tz).naive_local(),
        }
    }

    /// Parse a backend timestamp into this zone.
    ///
    /// Timestamps with an offset are converted; naive ones are already wall
    /// time here; bare dates are all-day values.
    pub fn parse(&self, raw: &str) -> Option<EventTime> {
        let raw = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(EventTime::At(self.wall_time(&dt)));
        }

        if let Some(naive) = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        {
            return Some(EventTime::At(naive));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .map(EventTime::AllDay)
    }

    /// Calendar day a timestamp falls on in this zone
    pub fn date_of(&self, raw: &str) -> Option<NaiveDate> {
        self.parse(raw).map(|t| t.date())
    }
}
