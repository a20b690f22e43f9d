//! Core of icsdrop.
//!
//! - `event` and `recurrence`: calendar events as read from a feed
//! - `ics`: feed parsing and single-event ICS generation
//! - `format`: timezone-aware display of event times
//! - `download`: saving one event as its own `.ics` file
//! - `surface`: content hooks for a calendar rendering surface

pub mod constants;
pub mod download;
pub mod error;
pub mod event;
pub mod format;
pub mod ics;
pub mod recurrence;
pub mod surface;

pub use download::{Blob, DirectoryTarget, SaveTarget, download_event, trigger_download};
pub use error::{IcsDropError, IcsDropResult};
pub use event::CalendarEvent;
pub use format::{FormatOptions, Formatter, HourCycle, Zone, format_time};
pub use ics::{generate_ics, parse_feed, strip_html};
pub use recurrence::{Frequency, Occurrence, RecurrenceRule, occurrences};
pub use surface::{ActionOutcome, RenderSurface, Tooltip, TooltipAction, event_content, mount};
