//! Date window for listing events.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use icsdrop_core::constants::DEFAULT_WINDOW_DAYS;
use icsdrop_core::format::local_to_utc;

/// Inclusive window of instants; dates given on the command line are
/// interpreted in the viewer's timezone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// - `from`: YYYY-MM-DD, defaults to DEFAULT_WINDOW_DAYS before `now`
    /// - `to`: YYYY-MM-DD, defaults to DEFAULT_WINDOW_DAYS after `now`
    pub fn from_args(
        from: Option<&str>,
        to: Option<&str>,
        tz: Tz,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let from_dt = match from {
            Some(s) => start_of_day(parse_date(s)?, tz),
            None => now - Duration::days(DEFAULT_WINDOW_DAYS),
        };
        let to_dt = match to {
            Some(s) => end_of_day(parse_date(s)?, tz),
            None => now + Duration::days(DEFAULT_WINDOW_DAYS),
        };

        if to_dt < from_dt {
            anyhow::bail!("--to must not be before --from");
        }

        Ok(DateRange {
            from: from_dt,
            to: to_dt,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

fn start_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    local_instant(date.and_time(NaiveTime::MIN), tz)
}

fn end_of_day(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    start_of_day(date + Duration::days(1), tz) - Duration::seconds(1)
}

fn local_instant(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    local_to_utc(naive, tz).unwrap_or_else(|| naive.and_utc())
}
