//! ICS generation and feed parsing.
//!
//! This module handles reading feeds and writing single-event documents
//! according to RFC 5545.

mod generate;
mod parse;
pub mod text;

pub use generate::{format_utc, generate_filename, generate_ics};
pub use parse::parse_feed;
pub use text::strip_html;
