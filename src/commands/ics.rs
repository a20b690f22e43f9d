use anyhow::{Context, Result};
use icsdrop_core::{CalendarEvent, generate_ics};

use super::find_event;

pub fn run(events: &[CalendarEvent], query: &str) -> Result<()> {
    let event = find_event(events, query)?;
    let ics = generate_ics(event).with_context(|| format!("Cannot serialize '{}'", event))?;
    print!("{}", ics);
    Ok(())
}
