//! Screen composition.
//!
//! Renders the sidebar, transcript, scroll affordance, input box, and footer
//! from `AppState`. Pure view code: nothing here mutates state.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use sift_core::scenario;
use sift_core::turn::{Role, Stage};

use crate::state::AppState;
use crate::transcript;

/// Sidebar width in columns, border included.
pub const SIDEBAR_WIDTH: u16 = 28;

/// Rows consumed by non-transcript chrome: header, input box, footer.
const CHROME_HEIGHT: u16 = 5;

/// Returns (text width, visible height) of the transcript viewport for the
/// given terminal size. The reducer uses the same numbers for scroll
/// geometry, so layout and scrolling can never disagree.
pub fn transcript_geometry(width: u16, height: u16, show_sidebar: bool) -> (u16, u16) {
    let main_width = if show_sidebar {
        width.saturating_sub(SIDEBAR_WIDTH)
    } else {
        width
    };
    // One column of padding on each side of the transcript.
    let text_width = main_width.saturating_sub(2);
    let visible = height.saturating_sub(CHROME_HEIGHT);
    (text_width, visible)
}

pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let main_area = if app.show_sidebar && area.width > SIDEBAR_WIDTH + 20 {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        render_sidebar(app, frame, chunks[0]);
        chunks[1]
    } else {
        area
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(main_area);

    render_header(app, frame, rows[0]);
    render_transcript(app, frame, rows[1]);
    render_input(app, frame, rows[2]);
    render_footer(frame, rows[3]);
}

fn render_sidebar(app: &AppState, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().add_modifier(Modifier::DIM));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(Span::styled(
            " sift",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::styled(
            " + New chat (Ctrl+N)",
            Style::default().fg(Color::Cyan),
        )),
        Line::default(),
        Line::from(Span::styled(
            " History",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    for title in app.past_conversations.iter().rev() {
        lines.push(Line::from(Span::styled(
            format!(" • {title}"),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_header(app: &AppState, frame: &mut Frame, area: Rect) {
    let status = match app
        .store
        .messages()
        .iter()
        .rev()
        .find(|m| m.role == Role::Agent && !m.welcome)
        .map(|m| m.stage)
    {
        Some(Stage::Thinking) if app.turn_state.is_running() => "thinking…",
        Some(Stage::Speaking) if app.turn_state.is_running() => "speaking…",
        Some(Stage::WorkflowRunning) if app.turn_state.is_running() => "running workflow…",
        _ => "",
    };

    let line = Line::from(vec![
        Span::styled(
            " Category Insight",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(status, Style::default().fg(Color::Cyan)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_transcript(app: &AppState, frame: &mut Frame, area: Rect) {
    let inner = Rect {
        x: area.x + 1,
        y: area.y,
        width: area.width.saturating_sub(2),
        height: area.height,
    };

    let lines = transcript::build_lines(
        app.store.messages(),
        app.store.is_pristine(),
        app.spinner_frame,
        inner.width,
    );
    let paragraph = Paragraph::new(lines).scroll((app.viewport.offset() as u16, 0));
    frame.render_widget(paragraph, inner);

    if app.viewport.alert_visible() && area.height > 0 {
        let alert_area = Rect {
            x: area.x,
            y: area.y + area.height - 1,
            width: area.width,
            height: 1,
        };
        let alert = Paragraph::new(Line::from(Span::styled(
            "● new content below — press End",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(alert, alert_area);
    }
}

fn render_input(app: &AppState, frame: &mut Frame, area: Rect) {
    let running = app.turn_state.is_running();
    let border_style = if running {
        Style::default().add_modifier(Modifier::DIM)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let content = if app.input.is_empty() {
        let hint = if running {
            "agent is working — Esc to cancel"
        } else {
            scenario::INPUT_PLACEHOLDER
        };
        Line::from(Span::styled(
            hint,
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(app.input.text().to_string())
    };
    frame.render_widget(Paragraph::new(content), inner);

    if !running {
        let max_x = inner.width.saturating_sub(1) as usize;
        let cursor_x = inner.x + app.input.cursor_chars().min(max_x) as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        " Enter send · Esc cancel · PgUp/PgDn scroll · Ctrl+B sidebar · Ctrl+N new · Ctrl+C quit",
        Style::default().add_modifier(Modifier::DIM),
    ));
    frame.render_widget(Paragraph::new(line), area);
}
