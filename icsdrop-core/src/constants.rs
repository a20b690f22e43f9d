/// PRODID written into generated documents
pub const PRODID: &str = "-//icsdrop//EN";

/// MIME type of downloaded documents
pub const ICS_MIME_TYPE: &str = "text/calendar";

/// Upper bound on expanded occurrences per recurring event
pub const MAX_OCCURRENCES: u16 = 366;

/// Number of days shown in each direction when no range is given
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
