//! Single-event ICS generation.

use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use super::text::{escape_text, fold_line, strip_html};
use crate::constants::PRODID;
use crate::error::{IcsDropError, IcsDropResult};
use crate::event::CalendarEvent;

/// Format a UTC timestamp as `YYYYMMDDTHHMMSSZ`, dropping sub-second precision.
///
/// Years outside 0000..=9999 have no basic-format encoding and are rejected.
pub fn format_utc(dt: DateTime<Utc>) -> IcsDropResult<String> {
    if !(0..=9999).contains(&dt.year()) {
        return Err(IcsDropError::InvalidTimestamp(format!(
            "{} is outside the year range 0000-9999",
            dt.to_rfc3339()
        )));
    }
    Ok(dt.format("%Y%m%dT%H%M%SZ").to_string())
}

/// Generate a standalone VCALENDAR document containing `event`.
///
/// DTSTAMP is the event start, so the same event always produces the same
/// document apart from the UID of events that arrived without one.
pub fn generate_ics(event: &CalendarEvent) -> IcsDropResult<String> {
    if event.end < event.start {
        return Err(IcsDropError::InvalidTimestamp(format!(
            "event '{}' ends ({}) before it starts ({})",
            event,
            event.end.to_rfc3339(),
            event.start.to_rfc3339()
        )));
    }

    let dtstart = format_utc(event.start)?;
    let dtend = format_utc(event.end)?;

    if event.title.is_none() {
        log::debug!("Event starting {} has no title, writing empty SUMMARY", dtstart);
    }
    if event.description.is_none() {
        log::debug!("Event '{}' has no description, writing empty DESCRIPTION", event);
    }

    let uid = match &event.uid {
        Some(uid) => uid.clone(),
        None => format!("{}@icsdrop", Uuid::new_v4()),
    };

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", escape_text(&uid)),
        format!("DTSTAMP:{}", dtstart),
        format!("DTSTART:{}", dtstart),
        format!("DTEND:{}", dtend),
        format!("SUMMARY:{}", escape_text(event.title_or_empty())),
        format!(
            "DESCRIPTION:{}",
            escape_text(&strip_html(event.description_or_empty()))
        ),
    ];

    if let Some(rule) = &event.recurrence {
        match rule.to_rrule_value() {
            Ok(value) => lines.push(format!("RRULE:{}", value)),
            Err(IcsDropError::UnsupportedRecurrence(reason)) => {
                log::warn!("Writing '{}' without RRULE: {}", event, reason);
            }
            Err(e) => return Err(e),
        }
    }

    lines.push("END:VEVENT".to_string());
    lines.push("END:VCALENDAR".to_string());

    Ok(lines.iter().map(|line| fold_line(line)).collect())
}

/// Download file name for an event: `<title>.ics`.
///
/// Characters that are not allowed in file names become `_`; an empty title
/// becomes `event`.
pub fn generate_filename(event: &CalendarEvent) -> String {
    let sanitized: String = event
        .title_or_empty()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = sanitized.trim().trim_matches('.');

    if stem.is_empty() {
        "event.ics".to_string()
    } else {
        format!("{}.ics", stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurrenceRule};
    use chrono::{NaiveDateTime, TimeZone, Timelike};
    use icalendar::parser::{read_calendar, unfold};
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn make_standup() -> CalendarEvent {
        CalendarEvent::new("Standup", utc(2024, 1, 1, 10), utc(2024, 1, 1, 11))
            .with_description("<b>daily</b>")
    }

    #[test]
    fn test_generate_ics_standup() {
        let ics = generate_ics(&make_standup()).unwrap();

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
        assert!(ics.contains("DTSTAMP:20240101T100000Z\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART:20240101T100000Z\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DTEND:20240101T110000Z\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("SUMMARY:Standup\r\n"), "ICS:\n{}", ics);
        assert!(ics.contains("DESCRIPTION:daily\r\n"), "ICS:\n{}", ics);
        assert!(!ics.contains("RRULE"));
    }

    #[test]
    fn test_generate_ics_recurrence() {
        let event = make_standup().with_recurrence(
            RecurrenceRule::new(Frequency::Weekly)
                .interval(2)
                .until(utc(2024, 3, 1, 0)),
        );

        let ics = generate_ics(&event).unwrap();
        assert!(
            ics.contains("RRULE:FREQ=WEEKLY;INTERVAL=2;UNTIL=20240301T000000Z\r\n"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_unsupported_recurrence_is_dropped() {
        let mut event = make_standup();
        event.recurrence = Some(RecurrenceRule {
            frequency: "BIWEEKLY".to_string(),
            interval: Some(1),
            until: None,
            source: None,
        });

        let ics = generate_ics(&event).unwrap();
        assert!(!ics.contains("RRULE"));
        assert!(ics.contains("SUMMARY:Standup"));
    }

    #[test]
    fn test_generate_ics_missing_fields_become_empty() {
        let mut event = make_standup();
        event.title = None;
        event.description = None;

        let ics = generate_ics(&event).unwrap();
        assert!(ics.contains("\r\nSUMMARY:\r\n"));
        assert!(ics.contains("\r\nDESCRIPTION:\r\n"));
    }

    #[test]
    fn test_generate_ics_escapes_text() {
        let event = CalendarEvent::new("Sync; planning, Q1", utc(2024, 1, 1, 10), utc(2024, 1, 1, 11))
            .with_description("<p>Line one</p>\nLine two, with comma");

        let ics = generate_ics(&event).unwrap();
        assert!(ics.contains("SUMMARY:Sync\\; planning\\, Q1\r\n"), "ICS:\n{}", ics);
        assert!(
            ics.contains("DESCRIPTION:Line one\\nLine two\\, with comma\r\n"),
            "ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_ics_truncates_subseconds() {
        let start = utc(2024, 1, 1, 10).with_nanosecond(987_654_321).unwrap();
        let event = CalendarEvent::new("Precise", start, start + chrono::Duration::minutes(30));

        let ics = generate_ics(&event).unwrap();
        assert!(ics.contains("DTSTART:20240101T100000Z\r\n"));
        assert!(ics.contains("DTEND:20240101T103000Z\r\n"));
    }

    #[test]
    fn test_generate_ics_keeps_feed_uid() {
        let mut event = make_standup();
        event.uid = Some("abc-123@example.com".to_string());

        let ics = generate_ics(&event).unwrap();
        assert!(ics.contains("UID:abc-123@example.com\r\n"));
    }

    #[test]
    fn test_generate_ics_end_before_start_is_invalid() {
        let event = CalendarEvent::new("Backwards", utc(2024, 1, 1, 11), utc(2024, 1, 1, 10));
        assert!(matches!(
            generate_ics(&event),
            Err(IcsDropError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_generate_ics_out_of_range_year_is_invalid() {
        let start = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
        let event = CalendarEvent::new("Far future", start, start);
        assert!(matches!(
            generate_ics(&event),
            Err(IcsDropError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_generate_ics_long_description_is_folded() {
        let event = make_standup().with_description("word ".repeat(60));
        let ics = generate_ics(&event).unwrap();

        assert!(ics.split("\r\n").all(|line| line.len() <= 75));
        assert!(ics.contains("\r\n "), "Expected a folded line. ICS:\n{}", ics);
    }

    #[test]
    fn test_generated_ics_parses_with_icalendar() {
        let ics = generate_ics(&make_standup()).unwrap();
        let unfolded = unfold(&ics);
        let calendar = read_calendar(&unfolded).expect("Should parse generated ICS");

        let vevent = calendar
            .components
            .iter()
            .find(|c| c.name == "VEVENT")
            .expect("Should contain a VEVENT");
        assert_eq!(vevent.find_prop("SUMMARY").unwrap().val.as_ref(), "Standup");
    }

    #[test]
    fn test_generate_filename() {
        assert_eq!(generate_filename(&make_standup()), "Standup.ics");

        let mut event = make_standup();
        event.title = Some("Q1/Q2: review?".to_string());
        assert_eq!(generate_filename(&event), "Q1_Q2_ review_.ics");

        event.title = Some("   ".to_string());
        assert_eq!(generate_filename(&event), "event.ics");

        event.title = None;
        assert_eq!(generate_filename(&event), "event.ics");
    }

    fn dtstart_of(ics: &str) -> DateTime<Utc> {
        let unfolded = unfold(ics);
        let calendar = read_calendar(&unfolded).expect("Should parse generated ICS");
        let vevent = calendar
            .components
            .iter()
            .find(|c| c.name == "VEVENT")
            .expect("Should contain a VEVENT");
        let value = vevent.find_prop("DTSTART").unwrap().val.to_string();
        NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
            .unwrap()
            .and_utc()
    }

    proptest! {
        #[test]
        fn dtstart_roundtrips_to_second_precision(
            secs in 0i64..253_402_300_799,
            nanos in 0u32..1_000_000_000,
            minutes in 0i64..100_000,
            title in "[a-zA-Z0-9 ,;]{0,30}",
        ) {
            let start = DateTime::<Utc>::from_timestamp(secs, nanos).unwrap();
            let end = start + chrono::Duration::minutes(minutes);
            prop_assume!(end.year() <= 9999);

            let event = CalendarEvent::new(title, start, end);
            let ics = generate_ics(&event).unwrap();

            prop_assert_eq!(dtstart_of(&ics), start.with_nanosecond(0).unwrap());
        }
    }
}
