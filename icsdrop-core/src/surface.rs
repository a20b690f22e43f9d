//! Rendering hooks.
//!
//! Drawing the calendar is left to a [`RenderSurface`]. This module only
//! supplies what goes into its hooks: the event content markup and a
//! [`Tooltip`] with formatted times and the download/close actions.

use std::path::PathBuf;

use crate::download::{SaveTarget, download_event};
use crate::error::IcsDropResult;
use crate::event::CalendarEvent;
use crate::format::Formatter;
use crate::ics::strip_html;

/// A calendar view that can draw events and attach tooltips to them.
pub trait RenderSurface {
    /// Handle to a drawn event, used to anchor its tooltip
    type Element;

    fn render(&mut self, event: &CalendarEvent, content_html: &str) -> Self::Element;

    fn attach_tooltip(&mut self, anchor: &Self::Element, tooltip: Tooltip);
}

/// Markup shown inside an event on the calendar grid.
pub fn event_content(event: &CalendarEvent) -> String {
    format!(
        "<b class=\"fc-event-title\">{}</b>",
        escape_html(event.title_or_empty())
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipAction {
    DownloadIcs,
    Close,
}

impl TooltipAction {
    pub fn label(&self) -> &'static str {
        match self {
            TooltipAction::DownloadIcs => "Download ICS",
            TooltipAction::Close => "Close",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Saved(PathBuf),
    Closed,
}

/// Contents of an event's click-triggered tooltip
#[derive(Debug, Clone)]
pub struct Tooltip {
    event: CalendarEvent,
    pub title: String,
    pub start: String,
    pub end: String,
    /// Description as supplied by the feed
    pub description: String,
    pub interactive: bool,
    pub actions: Vec<TooltipAction>,
}

impl Tooltip {
    pub fn for_event(event: &CalendarEvent, formatter: &Formatter) -> Self {
        Tooltip {
            event: event.clone(),
            title: event.title_or_empty().to_string(),
            start: formatter.format(event.start),
            end: formatter.format(event.end),
            description: event.description_or_empty().to_string(),
            interactive: true,
            actions: vec![TooltipAction::DownloadIcs, TooltipAction::Close],
        }
    }

    /// Modal markup; the description is trusted feed HTML and kept as is.
    pub fn to_html(&self) -> String {
        let buttons: String = self
            .actions
            .iter()
            .map(|action| {
                let class = match action {
                    TooltipAction::DownloadIcs => "modal-download",
                    TooltipAction::Close => "modal-close",
                };
                format!("<button class=\"{}\">{}</button>", class, action.label())
            })
            .collect();

        format!(
            "<div class=\"modal-container fc-event-tooltip\"><div class=\"modal-content\">\
             <b>{}</b><br></br><strong>Start:</strong> {}<br><strong>End:</strong> {}<br><br>{}<br>{}\
             </div></div>",
            escape_html(&self.title),
            self.start,
            self.end,
            self.description,
            buttons
        )
    }

    /// Plain-text rendering for surfaces without HTML.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            self.title.clone(),
            format!("Start: {}", self.start),
            format!("End: {}", self.end),
        ];
        let description = strip_html(&self.description);
        if !description.trim().is_empty() {
            lines.push(String::new());
            lines.push(description.trim().to_string());
        }
        lines.join("\n")
    }

    /// Serialize the event and save it through `target`.
    pub fn download(&self, target: &mut dyn SaveTarget) -> IcsDropResult<PathBuf> {
        download_event(&self.event, target)
    }

    pub fn activate(
        &self,
        action: TooltipAction,
        target: &mut dyn SaveTarget,
    ) -> IcsDropResult<ActionOutcome> {
        match action {
            TooltipAction::DownloadIcs => self.download(target).map(ActionOutcome::Saved),
            TooltipAction::Close => Ok(ActionOutcome::Closed),
        }
    }
}

/// Draw every event on `surface` and attach its tooltip.
pub fn mount<S: RenderSurface>(
    events: &[CalendarEvent],
    surface: &mut S,
    formatter: &Formatter,
) -> Vec<S::Element> {
    events
        .iter()
        .map(|event| {
            let element = surface.render(event, &event_content(event));
            surface.attach_tooltip(&element, Tooltip::for_event(event, formatter));
            element
        })
        .collect()
}

fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
