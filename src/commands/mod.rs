pub mod download;
pub mod ics;
pub mod list;
pub mod show;

use anyhow::Result;
use icsdrop_core::CalendarEvent;

/// Find an event by 1-based feed index or case-insensitive title substring.
pub fn find_event<'a>(events: &'a [CalendarEvent], query: &str) -> Result<&'a CalendarEvent> {
    if let Ok(index) = query.trim().parse::<usize>() {
        if let Some(event) = index.checked_sub(1).and_then(|i| events.get(i)) {
            return Ok(event);
        }
    }

    let needle = query.to_lowercase();
    if let Some(event) = events
        .iter()
        .find(|e| e.title_or_empty().to_lowercase().contains(&needle))
    {
        return Ok(event);
    }

    let available: Vec<String> = events
        .iter()
        .enumerate()
        .map(|(i, e)| format!("  [{}] {}", i + 1, e))
        .collect();
    anyhow::bail!(
        "No event matches '{}'.\n\nAvailable events:\n{}",
        query,
        available.join("\n")
    )
}
