//! Shared message formatting helpers for TUI rendering.

use bjornwatch_core::types::{LogItem, Role};
use chrono::Local;
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};

/// Speaker label and style for a transcript entry.
///
/// The child is shown under their real name once the backend reports it.
pub fn speaker_label(role: Role, child_name: &str) -> (String, Style) {
    match role {
        Role::User => (child_name.to_string(), Style::default().fg(Color::Cyan)),
        Role::Assistant => ("Björn".to_string(), Style::default().fg(Color::Green)),
    }
}

/// Format one transcript entry: a meta line, then its content lines.
pub fn transcript_entry(item: &LogItem, child_name: &str) -> Vec<Line<'static>> {
    let (label, style) = speaker_label(item.role, child_name);

    let time = item
        .timestamp()
        .map(|at| at.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string());

    let mut meta = vec![
        Span::styled(label, style.bold()),
        Span::styled(format!("  {}", time), Style::default().fg(Color::DarkGray)),
    ];
    if let Some(lang) = &item.lang {
        meta.push(Span::styled(
            format!("  [{}]", lang),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::from(meta)];
    for line in item.content.lines() {
        lines.push(Line::from(Span::raw(format!("  {}", line))));
    }
    lines
}
