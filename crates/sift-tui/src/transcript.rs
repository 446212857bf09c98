//! Transcript rendering: messages to styled lines.
//!
//! The transcript is built as a flat list of lines so the viewport can
//! scroll by line offset. The same builder is used for layout (line count)
//! and for drawing, keeping the two consistent.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use sift_core::scenario;
use sift_core::turn::{Message, Role, Stage, StepKind, StepStatus};
use sift_core::turn::workflow::FinalReport;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Spinner frames for running steps and the thinking pulse.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn spinner(frame: usize) -> &'static str {
    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

/// Builds the full transcript as styled lines at the given text width.
///
/// `pristine` controls whether the welcome quick actions are offered.
pub fn build_lines(
    messages: &[Message],
    pristine: bool,
    spinner_frame: usize,
    width: u16,
) -> Vec<Line<'static>> {
    let width = width.max(20) as usize;
    let mut lines = Vec::new();

    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        match message.role {
            Role::User => push_user(&mut lines, message, width),
            Role::Agent => push_agent(&mut lines, message, pristine, spinner_frame, width),
        }
    }

    lines
}

fn push_user(lines: &mut Vec<Line<'static>>, message: &Message, width: usize) {
    let style = Style::default().fg(Color::Cyan);
    for (i, row) in wrap(&message.text, width.saturating_sub(2)).into_iter().enumerate() {
        let prefix = if i == 0 { "› " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(prefix.to_string(), style.add_modifier(Modifier::BOLD)),
            Span::styled(row, style),
        ]));
    }
}

fn push_agent(
    lines: &mut Vec<Line<'static>>,
    message: &Message,
    pristine: bool,
    spinner_frame: usize,
    width: usize,
) {
    if message.welcome {
        for row in wrap(&message.text, width) {
            lines.push(Line::from(row));
        }
        if pristine {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Try:".to_string(), dim())));
            for (i, action) in scenario::QUICK_ACTIONS.iter().enumerate() {
                lines.push(Line::from(Span::styled(
                    format!("  {}. {action}", i + 1),
                    dim(),
                )));
            }
        }
        return;
    }

    if !message.thinking.is_empty() {
        let mut header = vec![Span::styled(
            "Thinking".to_string(),
            dim().add_modifier(Modifier::ITALIC),
        )];
        if message.stage == Stage::Thinking {
            header.push(Span::raw(" "));
            header.push(Span::styled(spinner(spinner_frame).to_string(), dim()));
        }
        lines.push(Line::from(header));
        for row in wrap(&message.thinking, width.saturating_sub(2)) {
            lines.push(Line::from(vec![
                Span::styled("│ ".to_string(), dim()),
                Span::styled(row, dim().add_modifier(Modifier::ITALIC)),
            ]));
        }
    }

    if !message.text.is_empty() {
        if !message.thinking.is_empty() {
            lines.push(Line::default());
        }
        let rows = wrap(&message.text, width);
        let last = rows.len().saturating_sub(1);
        for (i, row) in rows.into_iter().enumerate() {
            if i == last && message.stage == Stage::Speaking {
                lines.push(Line::from(vec![
                    Span::raw(row),
                    Span::styled("▌".to_string(), Style::default().fg(Color::Cyan)),
                ]));
            } else {
                lines.push(Line::from(row));
            }
        }
    }

    if !message.steps.is_empty() {
        lines.push(Line::default());
        if message.stage == Stage::WorkflowRunning {
            lines.push(Line::from(vec![
                Span::styled(
                    spinner(spinner_frame).to_string(),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(" Workflow running".to_string(), bold()),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled("✓".to_string(), Style::default().fg(Color::Green)),
                Span::styled(" Workflow finished".to_string(), bold()),
            ]));
        }
        for step in &message.steps {
            push_step_lines(lines, step, spinner_frame, width);
        }
    }

    if let Some(report) = &message.final_report {
        lines.push(Line::default());
        push_report(lines, report, width);
    }
}

fn push_step_lines(
    lines: &mut Vec<Line<'static>>,
    step: &sift_core::turn::Step,
    spinner_frame: usize,
    width: usize,
) {
    let glyph = match step.status {
        StepStatus::Pending => Span::styled("○".to_string(), dim()),
        StepStatus::Processing => Span::styled(
            spinner(spinner_frame).to_string(),
            Style::default().fg(Color::Cyan),
        ),
        StepStatus::Completed => {
            Span::styled("●".to_string(), Style::default().fg(Color::Green))
        }
    };

    let mut spans = vec![
        Span::raw("  "),
        glyph,
        Span::raw(" "),
        Span::styled(step.name.clone(), bold()),
        Span::styled(format!("  [{}]", kind_label(step.kind)), dim()),
    ];
    if let Some(elapsed_ms) = step.elapsed_ms {
        spans.push(Span::styled(
            format!("  ({:.1}s)", elapsed_ms as f64 / 1000.0),
            dim(),
        ));
    }
    lines.push(Line::from(spans));

    if step.status != StepStatus::Pending {
        for row in wrap(&step.content, width.saturating_sub(6)) {
            lines.push(Line::from(vec![
                Span::raw("      "),
                Span::styled(row, dim()),
            ]));
        }
    }
}

fn kind_label(kind: StepKind) -> &'static str {
    match kind {
        StepKind::Plan => "plan",
        StepKind::File => "file",
        StepKind::Action => "action",
        StepKind::Thought => "thought",
    }
}

fn push_report(lines: &mut Vec<Line<'static>>, report: &FinalReport, width: usize) {
    lines.push(Line::from(Span::styled(report.title.clone(), bold())));
    for bullet in &report.overview {
        for (i, row) in wrap(bullet, width.saturating_sub(2)).into_iter().enumerate() {
            let prefix = if i == 0 { "• " } else { "  " };
            lines.push(Line::from(format!("{prefix}{row}")));
        }
    }

    if report.brands.is_empty() {
        return;
    }
    lines.push(Line::default());

    // Fixed-width metric columns; strategy takes whatever is left.
    let brand_w = 8;
    let sell_w = 9;
    let top3_w = 6;
    let price_w = 10;
    let conv_w = 6;
    let fixed = brand_w + sell_w + top3_w + price_w + conv_w + 10;
    let strategy_w = width.saturating_sub(fixed).max(12);

    let header = format!(
        "{}  {}  {}  {}  {}  {}",
        pad("Brand", brand_w),
        pad("Strategy", strategy_w),
        pad("Sell-thru", sell_w),
        pad("TOP3", top3_w),
        pad("Price band", price_w),
        pad("Conv", conv_w),
    );
    lines.push(Line::from(Span::styled(
        header,
        bold().add_modifier(Modifier::UNDERLINED),
    )));

    for row in &report.brands {
        lines.push(Line::from(format!(
            "{}  {}  {}  {}  {}  {}",
            pad(&row.brand, brand_w),
            pad(&row.strategy, strategy_w),
            pad(&row.sell_through, sell_w),
            pad(&row.top3_share, top3_w),
            pad(&row.price_band, price_w),
            pad(&row.conversion, conv_w),
        )));
    }
}

/// Pads or truncates `text` to exactly `width` display columns. Truncation
/// reserves the last column for an ellipsis.
fn pad(text: &str, width: usize) -> String {
    let text_width = UnicodeWidthStr::width(text);
    if text_width <= width {
        let mut out = String::from(text);
        out.push_str(&" ".repeat(width - text_width));
        return out;
    }

    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

/// Greedy word wrap at display width, preserving explicit newlines.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            rows.push(String::new());
            continue;
        }
        let mut row = String::new();
        let mut row_width = 0;
        for word in paragraph.split(' ') {
            let word_width = UnicodeWidthStr::width(word);
            if row_width > 0 && row_width + 1 + word_width > width {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            if row_width > 0 {
                row.push(' ');
                row_width += 1;
            }
            // A single over-long word is hard-broken at the width.
            if word_width > width {
                for ch in word.chars() {
                    let w = ch.width().unwrap_or(0);
                    if row_width + w > width {
                        rows.push(std::mem::take(&mut row));
                        row_width = 0;
                    }
                    row.push(ch);
                    row_width += w;
                }
            } else {
                row.push_str(word);
                row_width += word_width;
            }
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use sift_core::turn::{ConversationStore, MessageId, MessagePatch};

    use super::*;

    #[test]
    fn wrap_respects_width_and_newlines() {
        let rows = wrap("one two three four", 9);
        assert_eq!(rows, vec!["one two", "three", "four"]);

        let rows = wrap("a\n\nb", 10);
        assert_eq!(rows, vec!["a", "", "b"]);
    }

    #[test]
    fn wrap_hard_breaks_long_words() {
        let rows = wrap("abcdefghij", 4);
        assert_eq!(rows, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn quick_actions_only_while_pristine() {
        let store = ConversationStore::with_welcome(scenario::WELCOME_TEXT);
        let with = build_lines(store.messages(), true, 0, 80);
        let without = build_lines(store.messages(), false, 0, 80);
        assert!(with.len() > without.len());
    }

    #[test]
    fn content_growth_adds_lines() {
        let mut store = ConversationStore::with_welcome(scenario::WELCOME_TEXT);
        store.append_user("analyze beverages");
        let id = MessageId::new();
        store.append_agent_placeholder(id).unwrap();
        let before = build_lines(store.messages(), false, 0, 80).len();

        store
            .patch_agent(
                id,
                MessagePatch {
                    thinking: Some("line one\nline two".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let after = build_lines(store.messages(), false, 0, 80).len();
        assert!(after > before);
    }

    #[test]
    fn report_table_pads_to_fixed_columns() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("abcd", 4), "abcd");
        assert_eq!(pad("abcdef", 4), "abc…");
        assert_eq!(pad("", 3), "   ");
        // Wide chars count as two columns when truncating.
        assert_eq!(pad("a品牌", 4), "a品…");
        assert_eq!(pad("a品牌", 3), "a… ");
    }
}
