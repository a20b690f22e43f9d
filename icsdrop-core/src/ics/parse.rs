//! Feed parsing using the icalendar crate's parser.
//!
//! Every VEVENT of the feed becomes a [`CalendarEvent`] with UTC timestamps.
//! Floating and all-day values are read in the viewer's timezone.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};

use super::text::unescape_text;
use crate::error::{IcsDropError, IcsDropResult};
use crate::event::CalendarEvent;
use crate::format::local_to_utc;
use crate::recurrence::RecurrenceRule;

/// Parse every VEVENT in `content`.
///
/// Events without a usable DTSTART are skipped with a warning; a document
/// that is not iCalendar at all is an error.
pub fn parse_feed(content: &str, tz: Tz) -> IcsDropResult<Vec<CalendarEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| IcsDropError::Feed(format!("Failed to parse calendar: {}", e)))?;

    let mut vevents = Vec::new();
    for component in &calendar.components {
        collect_vevents(component, &mut vevents);
    }

    let events: Vec<CalendarEvent> = vevents
        .into_iter()
        .filter_map(|vevent| {
            let event = parse_vevent(vevent, tz);
            if event.is_none() {
                let uid = vevent
                    .find_prop("UID")
                    .map(|p| p.val.to_string())
                    .unwrap_or_else(|| "<no uid>".to_string());
                log::warn!("Skipping VEVENT {} without a usable DTSTART", uid);
            }
            event
        })
        .collect();

    log::debug!("Parsed {} events from feed", events.len());
    Ok(events)
}

fn collect_vevents<'a>(component: &'a Component<'a>, out: &mut Vec<&'a Component<'a>>) {
    if component.name == "VEVENT" {
        out.push(component);
    } else {
        for child in &component.components {
            collect_vevents(child, out);
        }
    }
}

fn parse_vevent(vevent: &Component, tz: Tz) -> Option<CalendarEvent> {
    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()));
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()));

    let start = resolve(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?, tz)?;

    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|dpt| resolve(dpt, tz))
        .map(|end| end.utc)
        .or_else(|| {
            let duration = parse_duration(vevent.find_prop("DURATION")?.val.as_ref())?;
            let end = start.utc.checked_add_signed(duration);
            if end.is_none() {
                log::warn!(
                    "Ignoring out-of-range DURATION of VEVENT {}",
                    uid.as_deref().unwrap_or("<no uid>")
                );
            }
            end
        })
        .unwrap_or_else(|| {
            if start.all_day {
                start.utc + Duration::days(1)
            } else {
                start.utc + Duration::hours(1)
            }
        });

    // Floating UNTIL values belong to the start's zone
    let recurrence = vevent
        .find_prop("RRULE")
        .and_then(|p| RecurrenceRule::from_rrule_value(p.val.as_ref(), start.zone.unwrap_or(tz)));

    Some(CalendarEvent {
        uid,
        title,
        start: start.utc,
        end,
        start_tz: start.zone,
        description,
        recurrence,
    })
}

/// A DTSTART/DTEND value in UTC, with the zone its wall-clock time was given in
struct ResolvedTime {
    utc: DateTime<Utc>,
    all_day: bool,
    zone: Option<Tz>,
}

/// Resolve a DTSTART/DTEND value. DATE and floating values are read in `tz`.
fn resolve(dpt: DatePerhapsTime, tz: Tz) -> Option<ResolvedTime> {
    match dpt {
        DatePerhapsTime::Date(d) => Some(ResolvedTime {
            utc: local_to_utc(d.and_hms_opt(0, 0, 0)?, tz)?,
            all_day: true,
            zone: Some(tz),
        }),
        DatePerhapsTime::DateTime(cal_dt) => {
            let (utc, zone) = match cal_dt {
                CalendarDateTime::Utc(dt) => (dt, None),
                CalendarDateTime::Floating(naive) => (local_to_utc(naive, tz)?, Some(tz)),
                CalendarDateTime::WithTimezone { date_time, tzid } => {
                    let zone = tzid.parse::<Tz>().unwrap_or_else(|_| {
                        log::warn!("Unknown TZID '{}', reading time in {}", tzid, tz.name());
                        tz
                    });
                    (local_to_utc(date_time, zone)?, Some(zone))
                }
            };
            Some(ResolvedTime {
                utc,
                all_day: false,
                zone,
            })
        }
    }
}

/// Parse a DURATION value (`PT1H30M`, `P1D`, `-PT15M`, ...)
fn parse_duration(value: &str) -> Option<Duration> {
    let is_negative = value.starts_with('-');
    let duration_str = value.trim_start_matches(['-', '+']);

    let duration = iso8601::duration(duration_str).ok()?;
    let std_duration: std::time::Duration = duration.into();
    let duration = Duration::from_std(std_duration).ok()?;

    Some(if is_negative { -duration } else { duration })
}
