//! Terminal rendering surface.
//!
//! Events are drawn as rows grouped by day, colored with owo_colors. Each
//! row carries the event's feed index so it can be passed to `show` or
//! `download`.

use chrono::NaiveDate;
use icsdrop_core::{CalendarEvent, Formatter, RenderSurface, Tooltip};
use owo_colors::OwoColorize;

#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceOptions {
    /// Print each event's tooltip under its row
    pub details: bool,
    /// Print markup instead of plain text
    pub html: bool,
}

struct Row {
    date: NaiveDate,
    line: String,
    tooltip: Option<Tooltip>,
}

pub struct TerminalSurface {
    formatter: Formatter,
    options: SurfaceOptions,
    /// Feed index for each event passed to `render`, in call order
    labels: Vec<usize>,
    rows: Vec<Row>,
}

impl TerminalSurface {
    pub fn new(formatter: Formatter, options: SurfaceOptions, labels: Vec<usize>) -> Self {
        TerminalSurface {
            formatter,
            options,
            labels,
            rows: Vec::new(),
        }
    }

    /// Everything drawn so far, one day heading per date.
    pub fn output(&self) -> String {
        if self.rows.is_empty() {
            return "No events found".dimmed().to_string();
        }

        let mut lines = Vec::new();
        let mut current_date: Option<NaiveDate> = None;

        for row in &self.rows {
            if current_date != Some(row.date) {
                if current_date.is_some() {
                    lines.push(String::new());
                }
                lines.push(row.date.format("%a %b %-d, %Y").to_string().bold().to_string());
                current_date = Some(row.date);
            }

            lines.push(row.line.clone());

            if self.options.details {
                if let Some(tooltip) = &row.tooltip {
                    let body = if self.options.html {
                        tooltip.to_html()
                    } else {
                        tooltip.to_text()
                    };
                    for detail in body.lines() {
                        lines.push(format!("      {}", detail));
                    }
                }
            }
        }

        lines.join("\n")
    }
}

impl RenderSurface for TerminalSurface {
    type Element = usize;

    fn render(&mut self, event: &CalendarEvent, content_html: &str) -> usize {
        let element = self.rows.len();
        let label = self.labels.get(element).copied().unwrap_or(element) + 1;

        let tz = self.formatter.timezone();
        let time = format!(
            "{}-{}",
            self.formatter.format_clock(event.start),
            self.formatter.format_clock(event.end)
        );
        let title = if self.options.html {
            content_html.to_string()
        } else {
            event.to_string().bold().to_string()
        };
        let recurring = if event.is_recurring() { " ↻" } else { "" };

        self.rows.push(Row {
            date: event.start.with_timezone(&tz).date_naive(),
            line: format!(
                "  {} {} {}{}",
                format!("[{}]", label).dimmed(),
                time.dimmed(),
                title,
                recurring.cyan()
            ),
            tooltip: None,
        });
        element
    }

    fn attach_tooltip(&mut self, anchor: &usize, tooltip: Tooltip) {
        if let Some(row) = self.rows.get_mut(*anchor) {
            row.tooltip = Some(tooltip);
        }
    }
}
