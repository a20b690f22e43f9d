use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use icsdrop_core::{ActionOutcome, CalendarEvent, DirectoryTarget, Formatter, Tooltip, TooltipAction};
use owo_colors::OwoColorize;

use super::find_event;

pub fn run(events: &[CalendarEvent], query: &str, formatter: &Formatter, out: &Path) -> Result<()> {
    let path = save(events, query, formatter, out)?;
    println!("{} {}", "Saved".green(), path.display());
    Ok(())
}

/// Press the tooltip's download button for the matching event.
pub fn save(events: &[CalendarEvent], query: &str, formatter: &Formatter, out: &Path) -> Result<PathBuf> {
    let event = find_event(events, query)?;

    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create {}", out.display()))?;

    let mut target = DirectoryTarget::new(out);
    let tooltip = Tooltip::for_event(event, formatter);
    match tooltip
        .activate(TooltipAction::DownloadIcs, &mut target)
        .with_context(|| format!("Failed to download '{}'", event))?
    {
        ActionOutcome::Saved(path) => Ok(path),
        ActionOutcome::Closed => anyhow::bail!("Download of '{}' was cancelled", event),
    }
}
