use anyhow::Result;
use icsdrop_core::{CalendarEvent, Formatter, Occurrence, mount, occurrences};

use crate::date_range::DateRange;
use crate::render::{SurfaceOptions, TerminalSurface};

pub fn run(
    events: &[CalendarEvent],
    range: DateRange,
    formatter: Formatter,
    options: SurfaceOptions,
) -> Result<()> {
    println!("{}", render(events, range, formatter, options));
    Ok(())
}

/// Expand recurring events in `range` and draw every instance, sorted by start.
///
/// An event whose rule cannot be expanded is drawn once.
pub fn render(
    events: &[CalendarEvent],
    range: DateRange,
    formatter: Formatter,
    options: SurfaceOptions,
) -> String {
    let mut instances: Vec<(usize, CalendarEvent)> = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let expanded = occurrences(event, range.from, range.to).unwrap_or_else(|e| {
            log::warn!("Listing '{}' as a single event: {}", event, e);
            if event.start >= range.from && event.start <= range.to {
                vec![Occurrence {
                    start: event.start,
                    end: event.end,
                }]
            } else {
                Vec::new()
            }
        });

        for occurrence in expanded {
            let mut instance = event.clone();
            instance.start = occurrence.start;
            instance.end = occurrence.end;
            instances.push((index, instance));
        }
    }

    instances.sort_by_key(|(_, event)| event.start);
    log::debug!("{} instances between {} and {}", instances.len(), range.from, range.to);

    let (labels, instances): (Vec<usize>, Vec<CalendarEvent>) = instances.into_iter().unzip();
    let mut surface = TerminalSurface::new(formatter, options, labels);
    mount(&instances, &mut surface, &formatter);

    surface.output()
}
