//! Recurrence rules: FREQ/INTERVAL/UNTIL encoding and occurrence expansion.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::constants::MAX_OCCURRENCES;
use crate::error::{IcsDropError, IcsDropResult};
use crate::event::CalendarEvent;
use crate::format::local_to_utc;
use crate::ics::format_utc;

/// RFC 5545 FREQ values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            Frequency::Secondly => "SECONDLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = IcsDropError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SECONDLY" => Ok(Frequency::Secondly),
            "MINUTELY" => Ok(Frequency::Minutely),
            "HOURLY" => Ok(Frequency::Hourly),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(IcsDropError::UnsupportedRecurrence(format!(
                "unknown frequency '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ics_str())
    }
}

/// Recurrence of an event.
///
/// `frequency` keeps the raw token from the feed so that an unsupported value
/// is only rejected when the rule is encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: String,
    /// `None` means an interval of 1
    pub interval: Option<u32>,
    pub until: Option<DateTime<Utc>>,
    /// RRULE value as read from the feed. Parts other than FREQ, INTERVAL
    /// and UNTIL (COUNT, BYDAY, ...) are carried over from it.
    #[serde(default)]
    pub source: Option<String>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceRule {
            frequency: frequency.as_ics_str().to_string(),
            interval: None,
            until: None,
            source: None,
        }
    }

    pub fn interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// The parsed frequency, or `UnsupportedRecurrence`.
    pub fn frequency(&self) -> IcsDropResult<Frequency> {
        self.frequency.parse()
    }

    /// Encode as an RRULE value: `FREQ=<freq>;INTERVAL=<n>[;UNTIL=<ts>]`,
    /// followed by the remaining parts of the feed's rule.
    ///
    /// An unknown frequency or a zero interval is `UnsupportedRecurrence`;
    /// an UNTIL that cannot be written in basic format is `InvalidTimestamp`.
    pub fn to_rrule_value(&self) -> IcsDropResult<String> {
        let frequency = self.frequency()?;
        let interval = self.interval.unwrap_or(1);
        if interval == 0 {
            return Err(IcsDropError::UnsupportedRecurrence(
                "INTERVAL must be at least 1".to_string(),
            ));
        }

        let mut value = format!("FREQ={};INTERVAL={}", frequency, interval);
        if let Some(until) = self.until {
            value.push_str(";UNTIL=");
            value.push_str(&format_utc(until)?);
        }

        for (key, val) in self.source.iter().flat_map(|source| rrule_parts(source)) {
            match key.as_str() {
                "FREQ" | "INTERVAL" => {}
                // Dropping an unreadable UNTIL would make the series endless
                "UNTIL" if self.until.is_none() => {
                    return Err(IcsDropError::InvalidTimestamp(format!(
                        "RRULE UNTIL '{}' is not a valid timestamp",
                        val
                    )));
                }
                "UNTIL" => {}
                _ => {
                    value.push(';');
                    value.push_str(&key);
                    value.push('=');
                    value.push_str(val);
                }
            }
        }

        Ok(value)
    }

    /// Decode an RRULE value.
    ///
    /// FREQ, INTERVAL and UNTIL are read into fields, the whole value is kept
    /// in `source`. Floating and DATE UNTIL values are read in `tz`. Returns
    /// `None` without a FREQ part.
    pub fn from_rrule_value(value: &str, tz: Tz) -> Option<Self> {
        let mut frequency = None;
        let mut interval = None;
        let mut until = None;

        for part in value.split(';').filter(|part| !part.trim().is_empty()) {
            if !part.contains('=') {
                log::warn!("Ignoring malformed RRULE part '{}'", part);
            }
        }

        for (key, val) in rrule_parts(value) {
            match key.as_str() {
                "FREQ" => frequency = Some(val.to_ascii_uppercase()),
                "INTERVAL" => {
                    interval = val.parse().ok();
                    if interval.is_none() {
                        log::warn!("Ignoring RRULE INTERVAL '{}', using 1", val);
                    }
                }
                "UNTIL" => {
                    until = parse_until(val, tz);
                    if until.is_none() {
                        log::warn!("Cannot read RRULE UNTIL '{}'", val);
                    }
                }
                _ => {}
            }
        }

        Some(RecurrenceRule {
            frequency: frequency?,
            interval,
            until,
            source: Some(value.trim().to_string()),
        })
    }
}

/// `KEY=VALUE` parts of an RRULE value, keys uppercased.
fn rrule_parts(value: &str) -> impl Iterator<Item = (String, &str)> {
    value.split(';').filter_map(|part| {
        let (key, val) = part.split_once('=')?;
        Some((key.trim().to_ascii_uppercase(), val.trim()))
    })
}

fn parse_until(s: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if let Some(utc) = s.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }
    let naive = match NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S") {
        Ok(dt) => dt,
        Err(_) => NaiveDate::parse_from_str(s, "%Y%m%d")
            .ok()?
            .and_hms_opt(0, 0, 0)?,
    };
    local_to_utc(naive, tz)
}

/// A concrete occurrence of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Occurrences of `event` whose start lies in `[range_start, range_end]`.
///
/// Non-recurring events yield at most their own instance. A recurring event
/// with an unsupported rule is treated as non-recurring. Events with a start
/// zone recur at the same wall-clock time in that zone.
pub fn occurrences(
    event: &CalendarEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> IcsDropResult<Vec<Occurrence>> {
    let single = || {
        if event.start >= range_start && event.start <= range_end {
            vec![Occurrence {
                start: event.start,
                end: event.end,
            }]
        } else {
            Vec::new()
        }
    };

    let Some(rule) = &event.recurrence else {
        return Ok(single());
    };

    let rrule_value = match rule.to_rrule_value() {
        Ok(value) => value,
        Err(IcsDropError::UnsupportedRecurrence(reason)) => {
            log::warn!("Expanding '{}' without recurrence: {}", event, reason);
            return Ok(single());
        }
        Err(e) => return Err(e),
    };

    let rrule_str = format!("{}\nRRULE:{}", dtstart_line(event)?, rrule_value);
    let rrule_set: RRuleSet = match rrule_str.parse() {
        Ok(set) => set,
        Err(e) => {
            log::warn!("Failed to parse RRULE for event '{}': {}", event, e);
            return Ok(single());
        }
    };

    // after/before are exclusive, widen by a second to make the range inclusive
    let tz: rrule::Tz = Utc.into();
    let after = (range_start - Duration::seconds(1)).with_timezone(&tz);
    let before = (range_end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        log::debug!(
            "Occurrences of '{}' truncated at {}",
            event,
            MAX_OCCURRENCES
        );
    }

    let duration = event.end - event.start;
    Ok(result
        .dates
        .iter()
        .filter_map(|dt| {
            let start = dt.with_timezone(&Utc);
            let end = start.checked_add_signed(duration)?;
            Some(Occurrence { start, end })
        })
        .collect())
}

fn dtstart_line(event: &CalendarEvent) -> IcsDropResult<String> {
    let utc = format_utc(event.start)?;
    Ok(match event.start_tz {
        Some(tz) if tz != Tz::UTC => format!(
            "DTSTART;TZID={}:{}",
            tz.name(),
            event.start.with_timezone(&tz).format("%Y%m%dT%H%M%S")
        ),
        _ => format!("DTSTART:{}", utc),
    })
}
