//! Human-readable event times in an explicit timezone.
//!
//! The viewer's zone is passed in through [`FormatOptions`] instead of being
//! read from ambient state at format time. `Zone::Local` is resolved once,
//! when the [`Formatter`] is built.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{IcsDropError, IcsDropResult};

/// Timezone to display times in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The viewer's system timezone
    #[default]
    Local,
    Named(Tz),
}

impl FromStr for Zone {
    type Err = IcsDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        parse_timezone(s).map(Zone::Named)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => f.write_str("local"),
            Zone::Named(tz) => f.write_str(tz.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourCycle {
    /// `05:00 PM`
    H12,
    /// `17:00`
    #[default]
    H23,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatOptions {
    pub zone: Zone,
    pub hour_cycle: HourCycle,
}

impl FormatOptions {
    pub fn in_zone(tz: Tz) -> Self {
        FormatOptions {
            zone: Zone::Named(tz),
            hour_cycle: HourCycle::default(),
        }
    }
}

/// Formats timestamps as `<Month> <day>, <year> <hour>:<minute> <tz-abbrev>`
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    tz: Tz,
    hour_cycle: HourCycle,
}

impl Formatter {
    pub fn new(options: &FormatOptions) -> Self {
        let tz = match options.zone {
            Zone::Local => resolve_local_timezone(),
            Zone::Named(tz) => tz,
        };
        Formatter {
            tz,
            hour_cycle: options.hour_cycle,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        let pattern = match self.hour_cycle {
            HourCycle::H12 => "%B %-d, %Y %I:%M %p %Z",
            HourCycle::H23 => "%B %-d, %Y %H:%M %Z",
        };
        timestamp.with_timezone(&self.tz).format(pattern).to_string()
    }

    /// Time of day only, in the same hour cycle (`17:00` or `05:00 PM`)
    pub fn format_clock(&self, timestamp: DateTime<Utc>) -> String {
        let pattern = match self.hour_cycle {
            HourCycle::H12 => "%I:%M %p",
            HourCycle::H23 => "%H:%M",
        };
        timestamp.with_timezone(&self.tz).format(pattern).to_string()
    }
}

/// Format one timestamp with the given options.
pub fn format_time(timestamp: DateTime<Utc>, options: &FormatOptions) -> String {
    Formatter::new(options).format(timestamp)
}

/// The system's IANA timezone, or UTC if it cannot be determined.
pub fn resolve_local_timezone() -> Tz {
    match iana_time_zone::get_timezone() {
        Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
            log::warn!("Unrecognized system timezone '{}', using UTC", name);
            Tz::UTC
        }),
        Err(e) => {
            log::warn!("Could not determine system timezone ({}), using UTC", e);
            Tz::UTC
        }
    }
}

/// Resolve a wall-clock time in `tz`. Times skipped by a DST jump resolve
/// to the same wall-clock time an hour later; ambiguous times take the
/// earlier instant.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an IANA zone name.
pub fn parse_timezone(name: &str) -> IcsDropResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| IcsDropError::InvalidTimezone(name.to_string()))
}
