use anyhow::Result;
use icsdrop_core::{CalendarEvent, Formatter, Tooltip};

use super::find_event;

pub fn run(events: &[CalendarEvent], query: &str, formatter: &Formatter, html: bool) -> Result<()> {
    let tooltip = Tooltip::for_event(find_event(events, query)?, formatter);
    if html {
        println!("{}", tooltip.to_html());
    } else {
        println!("{}", tooltip.to_text());
    }
    Ok(())
}
