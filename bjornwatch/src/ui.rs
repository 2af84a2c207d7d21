//! UI rendering for the dashboard TUI.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Wrap,
    },
    Frame,
};

use crate::app::{App, LoginField, ViewMode};
use crate::message_format;

/// Border color for the login card
const BORDER_LOGIN: Color = Color::Rgb(0, 150, 150);
/// Border color for the conversation block
const BORDER_TRANSCRIPT: Color = Color::Rgb(80, 160, 80);
/// Label color for form fields
const LABEL_COLOR: Color = Color::Rgb(100, 180, 180);
/// Separator line color
const SEPARATOR_COLOR: Color = Color::Rgb(60, 60, 60);

/// Render the application UI.
pub fn render(frame: &mut Frame, app: &mut App) {
    match app.view_mode {
        ViewMode::Login => render_login_view(frame, app),
        ViewMode::Transcript => render_transcript_view(frame, app),
    }

    let area = frame.area();
    if let Some((message, _)) = app.toast.clone() {
        render_toast(frame, &message, area);
    }
}

// ========== Login View ==========

/// Render the login view (session code and PIN form).
fn render_login_view(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Layout: header, form, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Form
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_login_header(frame, chunks[0]);
    render_login_form(frame, app, chunks[1]);
    render_login_footer(frame, chunks[2]);
}

/// Render the app name header.
fn render_login_header(frame: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" bjornwatch", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "  Björn parent dashboard",
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Render the centered login card.
fn render_login_form(frame: &mut Frame, app: &App, area: Rect) {
    let card = centered_rect(50, 10, area);

    let label_style = |field: LoginField| {
        if app.focus == field {
            Style::default().fg(Color::Cyan).bold()
        } else {
            Style::default().fg(LABEL_COLOR)
        }
    };
    let cursor = |field: LoginField| if app.focus == field { "█" } else { "" };

    // The PIN never leaves the form unmasked.
    let masked_pin = "•".repeat(app.pin_input.chars().count());
    let remember_box = if app.remember { "[x]" } else { "[ ]" };

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(" Session code     ", label_style(LoginField::SessionCode)),
            Span::styled(app.code_input.clone(), Style::default().fg(Color::White)),
            Span::styled(
                cursor(LoginField::SessionCode),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" Parent password  ", label_style(LoginField::Pin)),
            Span::styled(masked_pin, Style::default().fg(Color::White)),
            Span::styled(cursor(LoginField::Pin), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            format!(" {} Remember me", remember_box),
            label_style(LoginField::Remember),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Ask Björn to say the session code out loud.",
            Style::default().fg(Color::DarkGray).italic(),
        )),
    ];

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(BORDER_LOGIN))
            .title(" Watch a session ")
            .title_style(Style::default().fg(BORDER_LOGIN).bold()),
    );
    frame.render_widget(paragraph, card);
}

/// Render the footer for the login view.
fn render_login_footer(frame: &mut Frame, area: Rect) {
    let footer = Line::from(vec![
        Span::styled(" Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" next field  "),
        Span::styled("Space", Style::default().fg(Color::Yellow)),
        Span::raw(" toggle remember  "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" watch  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

// ========== Transcript View ==========

/// Render the live transcript view.
fn render_transcript_view(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Layout: header, conversation, footer
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(5),    // Conversation
        Constraint::Length(1), // Footer
    ])
    .split(area);

    render_transcript_header(frame, app, chunks[0]);
    render_transcript(frame, app, chunks[1]);
    render_transcript_footer(frame, app, chunks[2]);
}

/// Render the header with the child's name and watch status.
fn render_transcript_header(frame: &mut Frame, app: &App, area: Rect) {
    let child_name = app
        .snapshot
        .as_ref()
        .and_then(|s| s.child_name.clone())
        .unwrap_or_else(|| "…".to_string());

    let status = if app.paused {
        Span::styled(
            "⏸ PAUSED",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "● LIVE",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {}", child_name),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(
            format!(" │ session {}", app.active_code),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw("  "),
        status,
    ]))
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

/// Render the conversation block.
fn render_transcript(frame: &mut Frame, app: &mut App, area: Rect) {
    let lines = transcript_lines(app);

    // Record this frame's geometry for the key handlers.
    app.viewport_rows = area.height.saturating_sub(2) as usize;
    app.content_rows = lines.len();

    // Clamp scroll offset
    let max_scroll = lines.len().saturating_sub(app.viewport_rows);
    if app.scroll_offset > max_scroll {
        app.scroll_offset = max_scroll;
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(BORDER_TRANSCRIPT))
                .title(" Conversation ")
                .title_style(Style::default().fg(BORDER_TRANSCRIPT).bold()),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset as u16, 0));

    frame.render_widget(paragraph, area);

    // Render scrollbar
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));

    let mut scrollbar_state = ScrollbarState::new(app.content_rows).position(app.scroll_offset);

    frame.render_stateful_widget(
        scrollbar,
        area.inner(ratatui::layout::Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

/// Build the conversation lines, or a placeholder for the empty states.
fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let Some(snapshot) = &app.snapshot else {
        return vec![Line::from(Span::styled(
            "Loading…",
            Style::default().fg(Color::DarkGray),
        ))];
    };

    if let Some(error) = &snapshot.last_error {
        return vec![Line::from(vec![
            Span::styled("Error: ", Style::default().fg(Color::Red)),
            Span::styled(error.clone(), Style::default().fg(Color::White)),
        ])];
    }

    if snapshot.messages.is_empty() {
        return vec![Line::from(Span::styled(
            "No messages in this session yet.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let child_name = snapshot.child_name.as_deref().unwrap_or("(unknown)");

    let mut lines: Vec<Line> = Vec::new();
    for (idx, item) in snapshot.messages.iter().enumerate() {
        // Add separator before each message (except first)
        if idx > 0 {
            lines.push(Line::from(Span::styled(
                "─".repeat(40),
                Style::default().fg(SEPARATOR_COLOR),
            )));
        }

        lines.extend(message_format::transcript_entry(item, child_name));
        lines.push(Line::raw("")); // Blank line after content
    }

    lines
}

/// Render the footer for the transcript view.
fn render_transcript_footer(frame: &mut Frame, app: &App, area: Rect) {
    let msg_count = app
        .snapshot
        .as_ref()
        .map(|s| s.messages.len())
        .unwrap_or(0);
    let pause_label = if app.paused { " resume  " } else { " pause  " };

    let footer = Line::from(vec![
        Span::styled(" j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" scroll  "),
        Span::styled("u/d", Style::default().fg(Color::Yellow)),
        Span::raw(" half page  "),
        Span::styled("g/G", Style::default().fg(Color::Yellow)),
        Span::raw(" top/bottom  "),
        Span::styled("p", Style::default().fg(Color::Yellow)),
        Span::raw(pause_label),
        Span::styled("r", Style::default().fg(Color::Yellow)),
        Span::raw(" refresh  "),
        Span::styled("e", Style::default().fg(Color::Yellow)),
        Span::raw(" export  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" log out  "),
        Span::styled("q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit  "),
        Span::raw("│ "),
        Span::styled(
            format!("{} messages", msg_count),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(footer), area);
}

// ========== Shared ==========

/// Render a transient toast near the bottom of the screen.
fn render_toast(frame: &mut Frame, message: &str, area: Rect) {
    let width = (message.chars().count() as u16 + 4).min(area.width);
    let height = 3;
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: (area.y + area.height).saturating_sub(height + 1),
        width,
        height,
    };

    frame.render_widget(Clear, rect);
    let toast = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Yellow)),
        );
    frame.render_widget(toast, rect);
}

/// Center a fixed-size box inside `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}
